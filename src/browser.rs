use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, EventRequestWillBeSent};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::{borrow::Cow, fs, path::Path, time::Duration};
use tokio::{sync::oneshot, time};
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::{constants::AWS_SAML_ENDPOINT, error::Error, saml::SamlAssertion};

const CHROME_ARGS: [&str; 4] = [
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-blink-features=AutomationControlled",
    "--no-startup-window",
];

/// Drive a visible Chrome through the IdP login at `auth_url` and return the
/// assertion it posts to the AWS sign-in endpoint.
///
/// Gives up with [`Error::Transport`] after `timeout`. Chrome is shut down
/// whether or not an assertion arrived.
pub async fn capture_assertion(
    auth_url: &str,
    user_data_dir: &Path,
    timeout: Duration,
) -> Result<SamlAssertion> {
    let mut browser = launch(user_data_dir).await?;

    let captured = time::timeout(timeout, await_post(&browser, auth_url)).await;

    if let Err(e) = browser.close().await {
        warn!("Failed to close Chrome cleanly: {}", e);
    }
    browser.wait().await.ok();

    let encoded = captured.map_err(|_| {
        Error::Transport(format!(
            "no SAML response within {} seconds of opening the login page",
            timeout.as_secs()
        ))
    })??;

    Ok(SamlAssertion::new(encoded))
}

async fn launch(user_data_dir: &Path) -> Result<Browser> {
    fs::create_dir_all(user_data_dir)
        .with_context(|| format!("Failed to create {}", user_data_dir.display()))?;

    let config = BrowserConfig::builder()
        .user_data_dir(user_data_dir)
        .with_head()
        .viewport(None)
        .args(CHROME_ARGS)
        .build()
        .map_err(|e| anyhow!("Invalid Chrome configuration: {e}"))?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .context("Failed to launch Chrome")?;
    tokio::spawn(async move { while handler.next().await.is_some() {} });

    debug!("Chrome started with profile {}", user_data_dir.display());
    Ok(browser)
}

async fn await_post(browser: &Browser, auth_url: &str) -> Result<String> {
    let page = browser.new_page("about:blank").await?;
    page.execute(EnableParams::default()).await?;

    // subscribe before navigating; an already signed-in IdP redirects at once
    let rx = watch_saml_post(&page).await?;

    info!("Opening identity provider login page");
    page.goto(auth_url).await?;
    eprintln!("Complete the login in the browser window.");

    rx.await
        .map_err(|_| anyhow!("Browser closed before the SAML response was posted"))
}

async fn watch_saml_post(page: &Page) -> Result<oneshot::Receiver<String>> {
    let mut events = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .context("Failed to watch network requests")?;
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let request = &event.request;
            if request.url != AWS_SAML_ENDPOINT || !request.has_post_data.unwrap_or(false) {
                continue;
            }
            let body: String = request
                .post_data_entries
                .iter()
                .flatten()
                .filter_map(|entry| entry.bytes.as_ref())
                .filter_map(|bytes| std::str::from_utf8(bytes.as_ref()).ok())
                .collect();

            match saml_response_field(&body) {
                Some(saml) => {
                    debug!("Captured SAML POST to {}", AWS_SAML_ENDPOINT);
                    let _ = tx.send(saml);
                    return;
                }
                None => warn!("POST to {} carried no SAMLResponse", AWS_SAML_ENDPOINT),
            }
        }
    });

    Ok(rx)
}

/// `SAMLResponse` from a form body that Chrome may or may not have base64
/// encoded as a whole
fn saml_response_field(body: &str) -> Option<String> {
    let decoded = STANDARD
        .decode(body)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok());

    [Some(Cow::Borrowed(body)), decoded.map(Cow::Owned)]
        .into_iter()
        .flatten()
        .find_map(|form| {
            form_urlencoded::parse(form.as_bytes())
                .find(|(key, _)| key == "SAMLResponse")
                .map(|(_, value)| value.into_owned())
        })
}
