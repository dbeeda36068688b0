use crate::config::Config;
use crate::db::Store;
use crate::services::Signup;
use crate::state::SharedState;

pub async fn cmd_user_create(
    config: Config,
    email: &str,
    name: &str,
    password: &str,
) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;

    let user = state
        .auth_service
        .create_verified_user(Signup {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })
        .await?;

    println!("✓ Created {} <{}> (ID: {})", user.name, user.email, user.id);
    println!("API key: {}", user.api_key);

    Ok(())
}

pub async fn cmd_user_api_key(config: &Config, email: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    match store.get_user_by_email(&email.trim().to_lowercase()).await? {
        Some(user) => println!("{}", user.api_key),
        None => println!("No account with email {email}."),
    }

    Ok(())
}
