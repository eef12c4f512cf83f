#![allow(dead_code)]

use std::time::Duration;

pub const SHORT_TIMEOUT: Duration = Duration::from_millis(500);
pub const LONG_TIMEOUT: Duration = Duration::from_secs(3);
pub const STRESS_TIMEOUT: Duration = Duration::from_secs(15);
pub const ITEMS_LOW: usize = 50;
pub const ITEMS_MEDIUM: usize = 200;
pub const ITEMS_HIGH: usize = 1000;

/// A payload tagged with its producer and sequence number.
pub fn tagged_payload(producer: usize, seq: usize) -> Vec<u8> {
  let mut payload = Vec::with_capacity(16);
  payload.extend_from_slice(&(producer as u64).to_le_bytes());
  payload.extend_from_slice(&(seq as u64).to_le_bytes());
  payload
}

pub fn untag_payload(payload: &[u8]) -> (usize, usize) {
  let mut producer = [0u8; 8];
  let mut seq = [0u8; 8];
  producer.copy_from_slice(&payload[..8]);
  seq.copy_from_slice(&payload[8..16]);
  (u64::from_le_bytes(producer) as usize, u64::from_le_bytes(seq) as usize)
}
