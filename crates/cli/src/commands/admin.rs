//! Admin grant management commands.
//!
//! Bootstrap path for the first admin: the HTTP endpoints require an
//! existing admin, the CLI does not.

use pixelfair_core::Email;
use pixelfair_server::db::AdminRepository;

use super::{CommandError, connect};

/// Grant admin to the account holding an email address.
pub async fn grant(email: &str) -> Result<(), CommandError> {
    let email = parse_email(email)?;
    let pool = connect().await?;

    let grant = AdminRepository::new(&pool).add_by_email(&email, None).await?;

    tracing::info!(admin_id = %grant.id, email = %grant.email, "Admin granted");
    Ok(())
}

/// Revoke the admin grant of an email address.
pub async fn revoke(email: &str) -> Result<(), CommandError> {
    let email = parse_email(email)?;
    let pool = connect().await?;

    let admins = AdminRepository::new(&pool);
    let grant = admins
        .list()
        .await?
        .into_iter()
        .find(|a| Email::normalized_eq(a.email.as_str(), email.as_str()))
        .ok_or_else(|| CommandError::InvalidInput(format!("{email} is not an admin")))?;

    admins.remove(grant.id).await?;

    tracing::info!(admin_id = %grant.id, email = %email, "Admin revoked");
    Ok(())
}

/// List all admin grants.
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;

    let admins = AdminRepository::new(&pool).list().await?;

    #[allow(clippy::print_stdout)]
    {
        if admins.is_empty() {
            println!("No admins configured");
        }
        for admin in admins {
            println!(
                "{:>4}  {:<40}  granted {}",
                admin.id.as_i32(),
                admin.email.as_str(),
                admin.created_at.format("%Y-%m-%d %H:%M")
            );
        }
    }

    Ok(())
}

fn parse_email(raw: &str) -> Result<Email, CommandError> {
    Email::parse(raw).map_err(|e| CommandError::InvalidInput(format!("invalid email: {e}")))
}
