mod client;
mod lookup;

pub use client::{ApiClientError, new_client};
pub use lookup::{DeviceLookup, FilterChoices, load_choices, load_directory};
