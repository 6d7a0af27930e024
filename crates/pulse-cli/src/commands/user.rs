use anyhow::Result;
use owo_colors::{OwoColorize, Style};
use pulse_core::models::{Identity, Role};
use pulse_core::repository::{IdentityRepository, Repository};

pub async fn add_user(
    repo: &dyn Repository,
    caller: Option<&Identity>,
    email: String,
    name: String,
    admin: bool,
) -> Result<()> {
    let role = if admin { Role::Admin } else { Role::Member };
    let user = repo.register_user(caller, Identity { email, name, role }).await?;

    println!(
        "{} Registered {} as {} ({})",
        "✓".style(Style::new().green().bold()),
        user.email.bright_white().bold(),
        user.name.cyan(),
        user.role
    );
    Ok(())
}

pub fn whoami(me: &Identity) -> Result<()> {
    println!("{} <{}>", me.name.bright_white().bold(), me.email);
    println!("  {} {}", "Role:".bright_black(), me.role);
    Ok(())
}
