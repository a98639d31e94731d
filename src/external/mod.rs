pub mod catalog;
pub mod notifier;

pub use catalog::{CatalogFilm, CatalogListing, CatalogProvider, NullCatalog};
pub use notifier::{LogNotifier, Notifier};
