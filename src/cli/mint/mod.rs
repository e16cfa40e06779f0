//! Mint command - prints keys without touching the store

use clap::Args;

use crate::infrastructure::api_key::KeyMinter;

#[derive(Args, Debug)]
pub struct MintArgs {
    /// Number of keys to print
    #[arg(short, long, default_value_t = 1)]
    pub count: usize,
}

pub fn run(args: &MintArgs) -> anyhow::Result<()> {
    let minter = KeyMinter::new();

    for key in mint_keys(&minter, args.count)? {
        println!("{}", key);
    }

    Ok(())
}

fn mint_keys(minter: &KeyMinter, count: usize) -> anyhow::Result<Vec<String>> {
    (0..count)
        .map(|_| minter.generate().map_err(anyhow::Error::from))
        .collect()
}
