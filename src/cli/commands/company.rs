//! Company profile from a running API.

use crate::client::ApiClient;
use crate::error::Result;

use super::render::print_company;
use super::{block_on, print_json};

/// Execute the company command.
///
/// # Errors
///
/// Returns [`crate::Error::Api`] with status 404 for an unknown company,
/// or [`crate::Error::Http`] if the API cannot be reached.
pub fn execute(server: &str, name: &str, json: bool) -> Result<()> {
    let client = ApiClient::new(server)?;
    let profile = block_on(async { client.company(name).await })??;

    if json {
        return print_json(&profile);
    }
    print_company(&profile);
    Ok(())
}
