// SPDX-License-Identifier: Apache-2.0

//! One handler per `titanctl` subcommand (§10, §6: the CLI surface that
//! talks to the admin listener).

use anyhow::Result;
use serde_json::json;

use crate::client::AdminClient;
use crate::exit_error::ExitError;

pub fn health(client: &AdminClient) -> Result<()> {
    let response = client.get("/health")?;
    println!("{}", response.body);
    if response.status != 200 {
        return Err(ExitError::new(1, format!("admin health check returned {}", response.status)).into());
    }
    Ok(())
}

pub fn metrics(client: &AdminClient, path: &str) -> Result<()> {
    let response = client.get(path)?;
    if response.status != 200 {
        return Err(ExitError::new(1, format!("metrics scrape returned {}", response.status)).into());
    }
    print!("{}", response.body);
    Ok(())
}

pub fn revoke(client: &AdminClient, jti: &str, exp: u64) -> Result<()> {
    let body = json!({ "jti": jti, "exp": exp }).to_string();
    let response = client.post("/_admin/jwt/revoke", &body)?;
    println!("{}", response.body);
    if response.status != 200 {
        return Err(ExitError::new(1, format!("revoke request returned {}", response.status)).into());
    }
    Ok(())
}
