//! Subcommand handlers. Each one drives the same view controllers the
//! navigation shell uses and prints the outcome.

use anyhow::{anyhow, bail, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io::{self, BufRead, IsTerminal, Write};

use emby_portal::config::Config;
use emby_portal::nav;
use emby_portal::session::SessionFile;
use emby_portal::validation::{Field, FieldErrors};
use emby_portal::views::admin::{self, AdminData, PendingAction, PlanDraft};
use emby_portal::views::account::{self, AccountView};
use emby_portal::views::info;
use emby_portal::views::login::LoginForm;
use emby_portal::views::pricing::{self, BillingCycle, PricingView};
use emby_portal::views::signup::SignupForm;
use emby_portal::views::Navigation;
use emby_portal::{PortalClient, PortalContext, PortalError};

use crate::{AdminAction, ConfigAction};

/// Build the client from config and adopt the persisted session
pub fn context(api_url: Option<String>) -> Result<PortalContext> {
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Ignoring unreadable config: {}", e);
        Config::default()
    });
    let client = PortalClient::new(&config.api_url(api_url), config.timeout())?;
    let session_file = match Config::session_path() {
        Ok(path) => Some(SessionFile::new(path)),
        Err(e) => {
            tracing::warn!("Session will not be persisted: {}", e);
            None
        }
    };
    let ctx = PortalContext::new(client, session_file);
    ctx.sync_from_disk();
    Ok(ctx)
}

fn form_failure(errors: &FieldErrors, general: Option<&str>) -> anyhow::Error {
    if !errors.is_empty() {
        anyhow!("{}", errors)
    } else {
        anyhow!("{}", general.unwrap_or("Request failed"))
    }
}

fn prompt_line(label: &str) -> Result<String> {
    eprint!("{}", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Read a password without echoing it
fn prompt_password(label: &str) -> Result<String> {
    if !io::stdin().is_terminal() {
        return prompt_line(label);
    }
    eprint!("{}", label);
    io::stderr().flush()?;
    terminal::enable_raw_mode()?;
    let result = read_hidden();
    terminal::disable_raw_mode()?;
    eprintln!();
    result
}

fn read_hidden() -> Result<String> {
    let mut password = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(password),
            KeyCode::Backspace => {
                password.pop();
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => bail!("Cancelled"),
            KeyCode::Esc => bail!("Cancelled"),
            KeyCode::Char(c) => password.push(c),
            _ => {}
        }
    }
}

/// Destructive actions need `--yes` or an interactive yes
fn confirm(yes: bool, action: &PendingAction) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        bail!("{} Pass --yes to confirm.", action.prompt());
    }
    let answer = prompt_line(&format!("{} [y/N] ", action.prompt()))?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

pub async fn status(ctx: &PortalContext) -> Result<()> {
    let status = ctx.resolver().resolve().await;
    println!("Backend: {}", ctx.client.base_url());
    if status.authenticated {
        println!("\x1b[32m✓ Signed in\x1b[0m");
        if status.is_admin {
            println!("\x1b[35m★ Admin access\x1b[0m");
        }
    } else {
        println!("\x1b[33m✗ Not signed in\x1b[0m");
        println!("Run '\x1b[1memby-portal login\x1b[0m' to sign in");
    }
    let links: Vec<&str> = nav::links_for(status).iter().map(|l| l.label).collect();
    println!("\x1b[90mAvailable: {}\x1b[0m", links.join(" | "));
    Ok(())
}

pub async fn login(ctx: &PortalContext, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(u) => u,
        None => prompt_line("Username: ")?,
    };
    let password = prompt_password("Password: ")?;

    let mut form = LoginForm::new();
    form.set(Field::Username, username);
    form.set(Field::Password, password);
    match form.submit(ctx).await {
        Some(_) => {
            println!("\x1b[1;32m✅ Login successful!\x1b[0m");
            Ok(())
        }
        None => Err(form_failure(&form.errors, form.general_error.as_deref())),
    }
}

pub async fn logout(ctx: &PortalContext) -> Result<()> {
    account::sign_out(ctx).await;
    println!("\x1b[32m✅ Logged out successfully\x1b[0m");
    Ok(())
}

pub async fn signup(
    ctx: &PortalContext,
    username: String,
    email: String,
    plan: Option<String>,
) -> Result<()> {
    let catalog = pricing::load_catalog(ctx).await.unwrap_or_else(|e| {
        tracing::warn!("Could not load plans: {}", e);
        Vec::new()
    });

    let mut form = SignupForm::new();
    form.set(Field::Username, username);
    form.set(Field::Email, email);
    form.set_plans(catalog, plan.as_deref());
    if let Some(wanted) = &plan {
        if form.selected_plan().map(|p| &p.plan_id) != Some(wanted) {
            bail!("Plan {} is not available. Run 'emby-portal pricing' to list plans.", wanted);
        }
    }

    match form.submit(ctx).await {
        Some(Navigation::External(url)) => {
            println!("\x1b[1;32m✅ Account created.\x1b[0m Complete payment to activate it:");
            println!("   \x1b[4m{}\x1b[0m", url);
            if let Some(password) = &form.temporary_password {
                println!();
                println!("\x1b[1;33mTemporary password: {}\x1b[0m", password);
                println!("\x1b[90mThis is shown only once. Use it to sign in to the portal and to Emby.\x1b[0m");
            }
            Ok(())
        }
        Some(Navigation::Route(_)) => {
            println!("\x1b[1;32m✅ Account created.\x1b[0m Run 'emby-portal account' to view it.");
            Ok(())
        }
        None => Err(form_failure(&form.errors, form.general_error.as_deref())),
    }
}

pub async fn account(ctx: &PortalContext, billing: bool) -> Result<()> {
    let mut view = AccountView::new();
    if view.apply_fetch(account::fetch_account(ctx).await).is_some() {
        bail!("{}. Run 'emby-portal login' to sign in.", account::FETCH_FAILED);
    }
    let Some(acct) = &view.account else {
        bail!(account::FETCH_FAILED);
    };

    println!("\x1b[1mAccount Dashboard\x1b[0m");
    println!("Username:     {}", acct.username);
    println!("Status:       {}", acct.status);
    println!("Plan:         {}", acct.plan_name.as_deref().unwrap_or("None"));
    println!("Next Renewal: {}", account::renewal_display(acct.expiry_date.as_deref()));
    if let Some(note) = account::status_note(&acct.status) {
        println!("\x1b[90m{}\x1b[0m", note);
    }

    match view.billing_portal() {
        Some(Navigation::External(url)) => {
            if billing {
                println!("Manage billing: \x1b[4m{}\x1b[0m", url);
            } else {
                println!("\x1b[90mRun with --billing for the billing portal link\x1b[0m");
            }
        }
        _ if billing => println!("No billing portal available for this account"),
        _ => {}
    }
    Ok(())
}

pub async fn pricing(ctx: &PortalContext, yearly: bool) -> Result<()> {
    let mut view = PricingView::new();
    view.apply_catalog(pricing::load_catalog(ctx).await);
    view.set_cycle(if yearly { BillingCycle::Yearly } else { BillingCycle::Monthly });

    let plans = view.filtered();
    if plans.is_empty() {
        println!("{}", view.empty_message());
        return Ok(());
    }
    let popular = view.most_popular().map(|p| p.plan_id.clone());
    for plan in plans {
        let badge = if popular.as_deref() == Some(plan.plan_id.as_str()) {
            "  \x1b[1;33mMOST POPULAR\x1b[0m"
        } else {
            ""
        };
        println!(
            "\x1b[1m{}\x1b[0m  {}/{}{}",
            plan.name,
            pricing::format_price(plan.price, &plan.currency),
            plan.interval,
            badge
        );
        if let Some(desc) = &plan.description {
            println!("  {}", desc);
        }
        for feature in pricing::plan_features(&plan.name) {
            println!("  \x1b[32m✓\x1b[0m {}", feature);
        }
        println!("  \x1b[90memby-portal signup --plan {} ...\x1b[0m", plan.plan_id);
        println!();
    }
    Ok(())
}

fn admin_error(err: PortalError) -> anyhow::Error {
    match err {
        PortalError::Unauthorized(_) | PortalError::Forbidden(_) => anyhow!(admin::denial_message(&err)),
        other => anyhow!("Error: {}", other.user_message("Request failed")),
    }
}

pub async fn admin(ctx: &PortalContext, action: AdminAction) -> Result<()> {
    match action {
        AdminAction::Users => {
            let data = admin::fetch_admin_data(ctx)
                .await
                .map_err(|e| anyhow!(admin::denial_message(&e)))?;
            print_users(&data);
        }
        AdminAction::Stats => {
            let stats = ctx.client.admin_stats().await.map_err(admin_error)?;
            println!("Total Emby Users:       {}", stats.total_emby_users);
            println!("Active Subscriptions:   {}", stats.active_subscriptions);
            println!("Pending Subscriptions:  {}", stats.pending_subscriptions);
            println!("Created via Management: {}", stats.created_via_management);
            for (key, value) in &stats.extra {
                println!("{}: {}", key, value);
            }
        }
        AdminAction::Plans => {
            let plans = ctx.client.admin_plans().await.map_err(admin_error)?;
            if plans.is_empty() {
                println!("No plans yet");
            }
            for plan in plans {
                let created = plan
                    .created_at()
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}  {}  {}/{}  {}  created {}",
                    plan.plan_id,
                    plan.name,
                    pricing::format_price(plan.price, &plan.currency),
                    plan.interval,
                    if plan.is_active { "\x1b[32mactive\x1b[0m" } else { "\x1b[90minactive\x1b[0m" },
                    created
                );
            }
        }
        AdminAction::PlanCreate {
            name,
            price,
            description,
            currency,
            interval,
        } => {
            let mut draft = PlanDraft {
                name,
                description: description.unwrap_or_default(),
                price,
                currency,
                interval: interval.parse().map_err(|e: String| anyhow!(e))?,
                ..PlanDraft::default()
            };
            let req = draft.to_request()?;
            let resp = admin::create_plan(ctx, &req).await.map_err(admin_error)?;
            println!("\x1b[32m✅ {}\x1b[0m", non_empty(&resp.message, "Plan created"));
        }
        AdminAction::PlanToggle { plan_id } => {
            let plans = ctx.client.admin_plans().await.map_err(admin_error)?;
            let Some(plan) = plans.iter().find(|p| p.plan_id == plan_id) else {
                bail!("Plan {} not found", plan_id);
            };
            let resp = admin::toggle_plan(ctx, &plan.plan_id, plan.is_active)
                .await
                .map_err(admin_error)?;
            println!("\x1b[32m✅ {}\x1b[0m", non_empty(&resp.message, "Plan updated"));
        }
        AdminAction::PlanArchive { plan_id, yes } => {
            if !confirm(yes, &PendingAction::ArchivePlan(plan_id.clone()))? {
                println!("Cancelled");
                return Ok(());
            }
            let resp = admin::archive_plan(ctx, &plan_id).await.map_err(admin_error)?;
            println!("\x1b[32m✅ {}\x1b[0m", non_empty(&resp.message, "Plan archived"));
        }
        AdminAction::UserToggle { username } => {
            protected_check(ctx, &username).await?;
            let resp = admin::toggle_user(ctx, &username).await.map_err(admin_error)?;
            let state = if resp.is_disabled { "disabled" } else { "enabled" };
            println!("\x1b[32m✅ User {} is now {}\x1b[0m", username, state);
        }
        AdminAction::UserDelete { username, yes } => {
            protected_check(ctx, &username).await?;
            if !confirm(yes, &PendingAction::DeleteUser(username.clone()))? {
                println!("Cancelled");
                return Ok(());
            }
            admin::delete_user(ctx, &username).await.map_err(admin_error)?;
            println!("\x1b[32m✅ User {} deleted\x1b[0m", username);
        }
    }
    Ok(())
}

fn non_empty<'a>(message: &'a str, fallback: &'a str) -> &'a str {
    if message.is_empty() {
        fallback
    } else {
        message
    }
}

/// Admin accounts expose no actions
async fn protected_check(ctx: &PortalContext, username: &str) -> Result<()> {
    let users = ctx.client.admin_users().await.map_err(admin_error)?;
    match users.iter().find(|u| u.username == username) {
        None => bail!("User {} not found", username),
        Some(u) if u.is_admin => bail!("User {} is an admin and is protected", username),
        Some(_) => Ok(()),
    }
}

fn print_users(data: &AdminData) {
    if data.users.is_empty() {
        println!("No users");
        return;
    }
    println!(
        "{:<20} {:<9} {:<12} {:<16} {:<28} {:<5} {}",
        "USERNAME", "STATUS", "SUBSCRIPTION", "PLAN", "EMAIL", "TOOL", "LAST ACTIVITY"
    );
    for user in &data.users {
        let name = if user.is_admin {
            format!("{} [ADMIN]", user.username)
        } else {
            user.username.clone()
        };
        println!(
            "{:<20} {:<9} {:<12} {:<16} {:<28} {:<5} {}",
            name,
            if user.is_disabled { "Disabled" } else { "Enabled" },
            user.subscription_status.as_str(),
            user.plan_name.as_deref().unwrap_or("None"),
            user.email.as_deref().unwrap_or("N/A"),
            if user.created_via_management { "Yes" } else { "No" },
            admin::format_last_activity(user.last_activity.as_deref())
        );
    }
}

pub fn support() {
    println!("\x1b[1mFrequently Asked Questions\x1b[0m");
    for faq in info::SUPPORT_FAQ {
        println!();
        println!("\x1b[1;35m{}\x1b[0m", faq.question);
        println!("{}", faq.answer);
    }
}

pub fn setup() {
    println!("\x1b[1m{}\x1b[0m", info::SETUP_TITLE);
    for section in info::SETUP_SECTIONS {
        println!();
        println!("\x1b[1;35m{}\x1b[0m", section.title);
        for line in section.lines {
            println!("  • {}", line);
        }
    }
}

pub fn config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Set { key, value } => {
            let mut config = Config::load().unwrap_or_default();
            match key.as_str() {
                "api_url" => {
                    PortalClient::new(&value, config.timeout())?;
                    config.api.base_url = Some(value);
                }
                "timeout_secs" => config.set_timeout_secs(&value)?,
                _ => bail!("Unknown config key: {}. Valid keys: api_url, timeout_secs", key),
            }
            config.save()?;
            println!("Configuration saved");
        }
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = match key.as_str() {
                "api_url" => config.api.base_url.unwrap_or_default(),
                "timeout_secs" => config.api.timeout_secs.map(|s| s.to_string()).unwrap_or_default(),
                _ => bail!("Unknown config key: {}", key),
            };
            println!("{}", value);
        }
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("api_url: {}", config.api.base_url.clone().unwrap_or_default());
            println!("timeout_secs: {}", config.timeout().as_secs());
            println!("effective api_url: {}", config.api_url(None));
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
