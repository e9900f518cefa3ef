use anyhow::Result;
use dialoguer::{Input, Password};
use tokentrack_session::{Registration, Session};

use crate::context::App;
use crate::output;

fn prompt_if_missing(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::<String>::new().with_prompt(prompt).interact_text()?),
    }
}

fn report(session: &Session) {
    match session.user() {
        Some(user) => println!("Signed in as {}", output::describe_user(user)),
        None => println!("Not signed in"),
    }
}

/// Run `login`.
pub async fn run_login(email: Option<String>) -> Result<()> {
    let app = App::open()?;
    let email = prompt_if_missing(email, "Email")?;
    let password = Password::new().with_prompt("Password").interact()?;

    let session = app.controller.login(&email, &password).await?;
    report(&session);
    Ok(())
}

/// Run `register`.
pub async fn run_register(name: Option<String>, email: Option<String>) -> Result<()> {
    let app = App::open()?;
    let name = prompt_if_missing(name, "Name")?;
    let email = prompt_if_missing(email, "Email")?;
    let password = Password::new().with_prompt("Password").interact()?;
    let confirm_password = Password::new().with_prompt("Confirm password").interact()?;

    let session = app
        .controller
        .register(&Registration {
            name,
            email,
            password,
            confirm_password,
        })
        .await?;
    report(&session);
    Ok(())
}

/// Run `logout`. Succeeds when already signed out.
pub fn run_logout() -> Result<()> {
    let app = App::open()?;
    app.controller.logout();
    println!("Signed out");
    Ok(())
}

/// Run `whoami`.
pub async fn run_whoami() -> Result<()> {
    let app = App::open()?;
    if !app.has_stored_token()? {
        println!("Not signed in");
        return Ok(());
    }
    let session = app.controller.restore().await;
    report(&session);
    Ok(())
}
