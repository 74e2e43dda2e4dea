//! Hash an access password for SALES_ACCESS_HASH. Reads one line from
//! stdin so the password never appears in shell history.

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

fn main() -> Result<()> {
    print!("Password: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;

    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        anyhow::bail!("Password must not be empty");
    }

    let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .context("Failed to hash password")?;

    println!("{}", hash);
    Ok(())
}
