//! # Self-verifying containers
//!
//! Two containers that audit themselves on every operation and report
//! corruption as typed errors instead of aborting:
//!
//! 1. **Stack**: growable LIFO buffer with a reserved sentinel slot,
//!    sentinel fill of unused slots and optional content digests
//! 2. **Tree**: binary tree persisted as bracketed text, with whole-tree
//!    parent/depth validation that records the root-to-fault path on a
//!    diagnostic stack
//!
//! Supporting pieces: the integrity hash and bit rotation (`hash`), value
//! traits (`types`) and the instance registry that hands out identities
//! (`registry`).
//!
//! ## Usage Example
//!
//! ```
//! use vigil::{Registry, Side};
//!
//! let mut registry = Registry::new();
//! let mut tree = registry.parse_tree::<i32>("demo", "[\n1\n[2]\n[3]\n]")?;
//! let root = tree.root().unwrap();
//! let two = tree.node(root).unwrap().right().unwrap();
//! tree.add_child(two, Side::Left, 4)?;
//!
//! let mut path = registry.stack("path")?;
//! assert!(tree.find_path(&mut path, &4)?);
//! assert_eq!(tree.path_values(&path)?, vec![&1, &2, &4]);
//! # Ok::<(), vigil::TreeError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod hash; // Integrity hash, digest layer, bit rotation
pub mod registry; // Instance identities
pub mod stack; // Self-verifying stack
pub mod tree; // Bracket-serialized binary tree
pub mod types; // Element and payload traits

pub use hash::{bit_rotate, Blake3Digest, Digest, IntegrityHash};
pub use registry::{InstanceId, Lifecycle, Registry};
pub use stack::{Stack, StackConfig, StackError};
pub use tree::{FaultKind, Node, NodeId, Side, SyntaxError, Tree, TreeConfig, TreeError};
pub use types::{Element, Payload};
