//! glTF 2.0 reader producing a typed, arena-backed asset graph.
//!
//! [`FileReader`] parses `.gltf` and `.glb` files into an [`Asset`]: buffers,
//! accessors, meshes, nodes, skins, animations, images and materials, with
//! every payload byte held in one arena owned by the asset. On top of the raw
//! graph the reader resolves skeleton topology (parents, root joints, proxy
//! roots for multi-root skins and bind poses), generates names and unique ids,
//! splits textures shared between normal and colour slots and validates all
//! stored indices.
//!
//! Diagnostics are collected in a [`MessageLog`]. An error message aborts the
//! read; warnings never do.
//!
//! ```no_run
//! use strata_gltf::{FileReader, ReadOptions};
//!
//! let reader = FileReader::with_options(ReadOptions::default());
//! let outcome = reader.read_file("model.glb");
//! for message in outcome.messages.iter() {
//!     println!("{}: {}", message.severity, message.text);
//! }
//! if let Some(asset) = outcome.asset {
//!     println!("{} nodes", asset.nodes.len());
//! }
//! ```

pub mod accessor;
pub mod animation;
pub mod asset;
pub mod convert;
pub mod draco;
pub mod error;
pub mod extensions;
pub mod glb;
pub mod messages;
pub mod names;
pub mod reader;
pub mod schema;
pub mod skeleton;
pub mod textures;
pub mod uri;
pub mod validation;

pub use animation::{
    animation_payload, animation_payloads, AnimationPayload, AnimationPayloadQuery, AnimationTrack, TrackValues,
};
pub use asset::Asset;
pub use draco::{BuiltinDracoDecoder, DecodedAttribute, DecodedDracoMesh, DracoDecoder};
pub use error::{GltfError, Result};
pub use extensions::Extension;
pub use messages::{Message, MessageLog, Severity};
pub use reader::{FileReader, ReadOptions, ReadOutcome};
