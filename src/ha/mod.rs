//! HA Manager
//!
//! Groups of N ≥ 2 stores protected by a single XOR parity sibling. The
//! parity file holds, for every block index, the XOR of all members'
//! corresponding data blocks; losing one member leaves its data
//! recoverable as parity XOR the surviving members.
//!
//! ## Member / Group Lifecycle
//! ```text
//! member:  active ──destroy──▶ destroyed ──second loss in group──▶ reaped
//! group:   live (d=0) ──▶ one-loss (d=1) ──▶ dissolved (d≥2)
//! ```
//!
//! A destroyed member keeps its directory: its metadata still locates
//! blocks for degraded reads. The second destruction dissolves the whole
//! group, releasing survivors and removing every destroyed member's
//! directory along with the group's own.

mod group;
mod parity;

pub(crate) use group::{create_group, destroy_member, ensure_group_writable};
pub(crate) use parity::{degraded_get, update_parity_block};
