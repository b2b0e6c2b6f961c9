//! `frais companies` - list known companies

use anyhow::Result;

use frais_core::CompanyDirectory;

pub fn cmd_companies(directory: &CompanyDirectory) -> Result<()> {
    println!("🏢 Known companies");
    for name in directory.names() {
        let profile = directory.lookup(name);
        match profile.address.as_deref() {
            Some(address) => println!("   {} ({})", name, address),
            None => println!("   {}", name),
        }
        if profile.logo.is_some() {
            println!("      (logo configured)");
        }
    }
    Ok(())
}
