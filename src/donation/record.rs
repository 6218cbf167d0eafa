use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::merkle::{put_field, LeafEncode};

/// One donation as supplied by the record store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    pub id: u64,
    pub charity_id: u64,
    pub donor_address: String,
    /// Amount in the smallest currency unit.
    pub amount: u128,
    pub tx_hash: String,
    pub created_at: DateTime<Utc>,
    /// Only confirmed donations enter a charity's tree.
    #[serde(default = "confirmed_by_default")]
    pub confirmed: bool,
}

fn confirmed_by_default() -> bool {
    true
}

/// Leaf layout:
/// `u64(id) || field(donor_address) || u128(amount) || i64(created_at secs) || field(tx_hash)`.
///
/// `charity_id` and `confirmed` only select the snapshot and stay out of the
/// leaf.  Sub-second precision of `created_at` is dropped.
impl LeafEncode for Donation {
    fn encode_leaf(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id.to_le_bytes());
        put_field(out, self.donor_address.as_bytes());
        out.extend_from_slice(&self.amount.to_le_bytes());
        out.extend_from_slice(&self.created_at.timestamp().to_le_bytes());
        put_field(out, self.tx_hash.as_bytes());
    }
}
