pub mod logbook;

pub use logbook::{text_digest, Logbook};
