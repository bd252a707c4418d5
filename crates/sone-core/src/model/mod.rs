pub mod definition;
pub mod post;
pub mod profile;
pub mod sone;
pub mod uri;

pub use definition::SoneDefinition;
pub use post::{Post, Reply};
pub use profile::Profile;
pub use sone::{PublishedSone, Sone, SoneHandle};
pub use uri::{FreenetUri, KeyType};
