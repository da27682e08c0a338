pub mod clock;
pub mod config;
pub mod error;
pub mod history;
pub mod ids;
pub mod limits;
pub mod model;
pub mod mutation;
pub mod registry;
pub mod selection;
pub mod session;
pub mod share;
pub mod shortcuts;
pub mod store;

pub use config::EditorConfig;
pub use error::{GraphError, MutationError, RegistryError, SessionError, ShareError, StoreError};
pub use history::History;
pub use ids::{IdGenerator, SequentialIds, UuidIds};
pub use model::{
    GraphEdge, GraphNode, GraphSnapshot, NodeData, NodeKind, NodePatch, NodeStatus, Position,
    Priority, Relationship, Side, Viewport,
};
pub use mutation::Connection;
pub use registry::{MapMetadata, MapMetadataPatch, MapRegistry};
pub use selection::Selection;
pub use session::{Dispatch, EditingSession};
pub use share::{SharedLink, SharedMap};
pub use shortcuts::{EditorCommand, KeyChord};
pub use store::{KeyValueStore, MapStorage, MemoryStore};
