//! Drawing. Every route shares the nav bar and the status line.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
};

use crate::validation::{Field, FieldErrors};
use crate::views::account::{self, AccountView};
use crate::views::admin::{self, AdminAccess, AdminTab, AdminView, PlanDraft};
use crate::views::info;
use crate::views::login::LoginForm;
use crate::views::pricing::{self, BillingCycle, PricingView};
use crate::views::signup::SignupForm;
use crate::views::NoticeKind;

use super::app::{App, Page};

const ACCENT: Color = Color::Magenta;

pub fn draw(frame: &mut Frame, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    draw_nav_bar(frame, app, layout[0]);

    let block = Block::default()
        .title(format!(" {} ", app.route.title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));
    let inner = block.inner(layout[1]);
    frame.render_widget(block, layout[1]);

    match &app.page {
        Page::Welcome(view) => draw_welcome(frame, app, view, inner),
        Page::Signup(form) => draw_signup(frame, app, form, inner),
        Page::Login(form) => draw_login(frame, app, form, inner),
        Page::Account(view) => draw_account(frame, view, inner),
        Page::Setup => draw_setup(frame, app, inner),
        Page::Support => draw_support(frame, app, inner),
        Page::Pricing(view) => draw_pricing(frame, view, inner),
        Page::Admin(view) => draw_admin(frame, app, view, inner),
    }

    draw_status_bar(frame, app, layout[2]);
}

fn draw_nav_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        " Emby Galaxy ",
        Style::default().fg(Color::Black).bg(ACCENT).add_modifier(Modifier::BOLD),
    )];
    for link in app.links() {
        spans.push(Span::raw(" "));
        let style = if link.route == app.route {
            Style::default().fg(ACCENT).add_modifier(Modifier::REVERSED | Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", link.label), style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn key_hints(page: &Page) -> &'static str {
    match page {
        Page::Welcome(_) => "Enter/p: Pricing | s: Sign up | l: Log in",
        Page::Signup(_) => "Tab: Next field | ←/→: Plan | Enter: Sign up",
        Page::Login(_) => "Tab: Next field | Enter: Log in",
        Page::Account(_) => "b: Manage billing | o: Sign out | r: Refresh",
        Page::Setup | Page::Support => "↑/↓ PgUp/PgDn: Scroll",
        Page::Pricing(_) => "m/y: Monthly/Yearly | ←/→: Choose | Enter: Get started",
        Page::Admin(view) if view.draft.is_some() => "Tab: Next | ←/→: Pick | Enter: Create | Esc: Cancel",
        Page::Admin(view) if view.pending.is_some() => "y: Confirm | any other key: Cancel",
        Page::Admin(view) => match view.tab {
            AdminTab::Users => "u/p: Tabs | e: Enable/Disable | d: Delete | r: Refresh",
            AdminTab::Plans => "u/p: Tabs | n: New | a: Toggle active | x: Archive | r: Refresh",
        },
    }
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let session = match (app.status.authenticated, app.status.is_admin) {
        (false, _) => "Guest",
        (true, false) => "Signed in",
        (true, true) => "Signed in (admin)",
    };
    let mut spans = vec![Span::raw(format!(" {} ", session))];
    if let Some(notice) = &app.notice {
        let color = match notice.kind {
            NoticeKind::Info => Color::Cyan,
            NoticeKind::Success => Color::Green,
            NoticeKind::Error => Color::Red,
        };
        spans.push(Span::styled(format!("| {} ", notice.text), Style::default().fg(color)));
    }
    spans.push(Span::raw(format!(
        "| {} | Ctrl+N/P: Navigate | Ctrl+C: Quit ",
        key_hints(&app.page)
    )));

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(paragraph, area);
}

fn heading(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(
        text.into(),
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    ))
}

fn muted(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(text.into(), Style::default().fg(Color::DarkGray)))
}

fn error_line(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(text.into(), Style::default().fg(Color::Red)))
}

/// One labelled input with its error underneath
fn input_lines(label: &str, value: &str, focused: bool, error: Option<&str>) -> Vec<Line<'static>> {
    let marker = if focused { "▸ " } else { "  " };
    let cursor = if focused { "_" } else { "" };
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{}{:<10}", marker, label), style),
        Span::raw(format!("{}{}", value, cursor)),
    ])];
    if let Some(error) = error {
        lines.push(error_line(format!("  {}", error)));
    }
    lines
}

fn field_error(errors: &FieldErrors, field: Field) -> Option<&str> {
    errors.get(field)
}

fn draw_welcome(frame: &mut Frame, app: &App, view: &PricingView, area: Rect) {
    let mut lines = vec![heading(info::WELCOME_TITLE), Line::raw(""), Line::raw(info::WELCOME_TAGLINE), Line::raw("")];
    if !view.loading {
        if let Some(price) = info::starting_price(&view.plans) {
            lines.push(Line::from(Span::styled(price, Style::default().fg(Color::Yellow))));
            lines.push(Line::raw(""));
        }
    }
    for (title, body) in info::WELCOME_FEATURES {
        lines.push(Line::from(Span::styled(*title, Style::default().add_modifier(Modifier::BOLD))));
        lines.push(muted(format!("  {}", body)));
    }
    lines.push(Line::raw(""));
    if app.status.authenticated {
        lines.push(muted("You are signed in. Open Account from the nav bar."));
    } else {
        lines.push(muted("New here? Press s to get started, or l to log in."));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn draw_signup(frame: &mut Frame, app: &App, form: &SignupForm, area: Rect) {
    let focused = SignupForm::FIELDS.get(app.field).copied();
    let mut lines = vec![heading("Create your account"), Line::raw("")];
    lines.extend(input_lines(
        "Username",
        &form.username,
        focused == Some(Field::Username),
        field_error(&form.errors, Field::Username),
    ));
    lines.extend(input_lines(
        "Email",
        &form.email,
        focused == Some(Field::Email),
        field_error(&form.errors, Field::Email),
    ));

    let plan_label = match form.selected_plan() {
        Some(plan) => format!(
            "◂ {} - {}/{} ▸",
            plan.name,
            pricing::format_price(plan.price, &plan.currency),
            plan.interval
        ),
        None if form.plans.is_empty() => "No plans available".to_string(),
        None => "Select a plan".to_string(),
    };
    lines.extend(input_lines(
        "Plan",
        &plan_label,
        focused == Some(Field::Plan),
        field_error(&form.errors, Field::Plan),
    ));
    lines.push(Line::raw(""));

    if form.submitting {
        lines.push(muted("Creating account..."));
    }
    if let Some(error) = &form.general_error {
        lines.push(error_line(error.clone()));
    }
    if let Some(url) = &app.handoff {
        lines.push(Line::raw("Complete your payment to activate the subscription:"));
        lines.push(Line::from(Span::styled(
            url.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
        )));
    }
    if let Some(password) = &form.temporary_password {
        lines.push(Line::from(Span::styled(
            format!("Temporary password: {} (shown only once)", password),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn draw_login(frame: &mut Frame, app: &App, form: &LoginForm, area: Rect) {
    let focused = LoginForm::FIELDS.get(app.field).copied();
    let mut lines = vec![heading("Welcome back"), Line::raw("")];
    lines.extend(input_lines(
        "Username",
        &form.username,
        focused == Some(Field::Username),
        field_error(&form.errors, Field::Username),
    ));
    let masked = "•".repeat(form.password.chars().count());
    lines.extend(input_lines(
        "Password",
        &masked,
        focused == Some(Field::Password),
        field_error(&form.errors, Field::Password),
    ));
    lines.push(Line::raw(""));
    if form.submitting {
        lines.push(muted("Signing in..."));
    }
    if let Some(error) = &form.general_error {
        lines.push(error_line(error.clone()));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn draw_account(frame: &mut Frame, view: &AccountView, area: Rect) {
    let Some(acct) = &view.account else {
        let text = if view.loading { "Loading..." } else { "Signed out" };
        frame.render_widget(Paragraph::new(muted(text)), area);
        return;
    };

    let status_style = match acct.status {
        shared::AccountStatus::Active => Style::default().fg(Color::Green),
        shared::AccountStatus::Pending => Style::default().fg(Color::Yellow),
        _ => Style::default().fg(Color::Gray),
    };
    let mut lines = vec![
        heading("Account Dashboard"),
        muted("Manage your Emby subscription"),
        Line::raw(""),
        Line::from(vec![Span::raw("Username      "), Span::raw(acct.username.clone())]),
        Line::from(vec![Span::raw("Status        "), Span::styled(acct.status.to_string(), status_style)]),
        Line::from(vec![
            Span::raw("Plan          "),
            Span::raw(acct.plan_name.clone().unwrap_or_else(|| "None".to_string())),
        ]),
        Line::from(vec![
            Span::raw("Next Renewal  "),
            Span::raw(account::renewal_display(acct.expiry_date.as_deref())),
        ]),
        Line::raw(""),
    ];
    if let Some(note) = account::status_note(&acct.status) {
        lines.push(Line::from(Span::styled(note, status_style)));
    }
    if acct.billing_portal_url.is_some() {
        lines.push(muted("Press b to manage billing"));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn draw_setup(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![heading(info::SETUP_TITLE), Line::raw("")];
    for section in info::SETUP_SECTIONS {
        lines.push(Line::from(Span::styled(
            section.title,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for line in section.lines {
            lines.push(Line::raw(format!("  • {}", line)));
        }
        lines.push(Line::raw(""));
    }
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).scroll((app.scroll, 0)),
        area,
    );
}

fn draw_support(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![heading("Frequently Asked Questions"), Line::raw("")];
    for faq in info::SUPPORT_FAQ {
        lines.push(Line::from(Span::styled(
            faq.question,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::raw(faq.answer));
        lines.push(Line::raw(""));
    }
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).scroll((app.scroll, 0)),
        area,
    );
}

fn draw_pricing(frame: &mut Frame, view: &PricingView, area: Rect) {
    let toggle = |cycle: BillingCycle, label: &'static str| {
        if view.cycle == cycle {
            Span::styled(
                format!(" {} ", label),
                Style::default().fg(Color::Black).bg(ACCENT).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw(format!(" {} ", label))
        }
    };
    let mut lines = vec![
        heading("Choose Your Plan"),
        Line::from(vec![toggle(BillingCycle::Monthly, "Monthly"), Span::raw(" "), toggle(BillingCycle::Yearly, "Yearly")]),
        Line::raw(""),
    ];

    let plans = view.filtered();
    if view.loading {
        lines.push(muted("Loading pricing plans..."));
    } else if plans.is_empty() {
        lines.push(muted(view.empty_message()));
    } else {
        let popular = view.most_popular().map(|p| p.plan_id.as_str());
        for (i, plan) in plans.iter().enumerate() {
            let selected = i == view.cursor;
            let marker = if selected { "▸ " } else { "  " };
            let mut spans = vec![
                Span::styled(
                    format!("{}{}", marker, plan.name),
                    if selected {
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().add_modifier(Modifier::BOLD)
                    },
                ),
                Span::raw(format!(
                    "  {}/{}",
                    pricing::format_price(plan.price, &plan.currency),
                    plan.interval
                )),
            ];
            if popular == Some(plan.plan_id.as_str()) {
                spans.push(Span::styled(
                    "  MOST POPULAR",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ));
            }
            lines.push(Line::from(spans));
            if selected {
                for feature in pricing::plan_features(&plan.name) {
                    lines.push(Line::from(vec![
                        Span::styled("     ✓ ", Style::default().fg(Color::Green)),
                        Span::raw(*feature),
                    ]));
                }
            }
        }
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn draw_admin(frame: &mut Frame, app: &App, view: &AdminView, area: Rect) {
    match &view.access {
        AdminAccess::Loading => {
            frame.render_widget(Paragraph::new(muted("Loading admin panel...")), area);
            return;
        }
        AdminAccess::Denied(message) => {
            let lines = vec![
                heading("Access Denied"),
                Line::raw(""),
                error_line(message.clone()),
                Line::raw("Please log in with an admin account to access this page."),
            ];
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
            return;
        }
        AdminAccess::Granted => {}
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0), Constraint::Length(2)])
        .split(area);

    let stats = &view.stats;
    frame.render_widget(
        Paragraph::new(format!(
            "Emby users: {}  Active: {}  Pending: {}  Via management: {}",
            stats.total_emby_users, stats.active_subscriptions, stats.pending_subscriptions, stats.created_via_management
        )),
        layout[0],
    );

    let tab_span = |tab: AdminTab| {
        if view.tab == tab {
            Span::styled(
                format!(" {} ", tab.title()),
                Style::default().fg(Color::Black).bg(ACCENT),
            )
        } else {
            Span::raw(format!(" {} ", tab.title()))
        }
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![tab_span(AdminTab::Users), Span::raw(" "), tab_span(AdminTab::Plans)])),
        layout[1],
    );

    match (&view.draft, view.tab) {
        (Some(draft), _) => draw_plan_draft(frame, app, draft, layout[2]),
        (None, AdminTab::Users) => draw_users(frame, view, layout[2]),
        (None, AdminTab::Plans) => draw_plans(frame, view, layout[2]),
    }

    let footer = if let Some(pending) = &view.pending {
        Line::from(Span::styled(
            format!("{} [y/N]", pending.prompt()),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
    } else if let Some(notice) = &view.notice {
        let color = match notice.kind {
            NoticeKind::Error => Color::Red,
            NoticeKind::Success => Color::Green,
            NoticeKind::Info => Color::Cyan,
        };
        Line::from(Span::styled(notice.text.clone(), Style::default().fg(color)))
    } else if view.loading {
        muted("Refreshing...")
    } else {
        Line::raw("")
    };
    frame.render_widget(Paragraph::new(footer).wrap(Wrap { trim: false }), layout[3]);
}

fn draw_users(frame: &mut Frame, view: &AdminView, area: Rect) {
    let header = Row::new(["Username", "Status", "Subscription", "Plan", "Email", "Via Tool", "Last Activity"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = view.users.iter().map(|user| {
        let name = if user.is_admin {
            format!("{} [ADMIN]", user.username)
        } else {
            user.username.clone()
        };
        let row = Row::new(vec![
            Cell::from(name),
            Cell::from(if user.is_disabled { "Disabled" } else { "Enabled" }),
            Cell::from(user.subscription_status.to_string()),
            Cell::from(user.plan_name.clone().unwrap_or_else(|| "None".to_string())),
            Cell::from(user.email.clone().unwrap_or_else(|| "N/A".to_string())),
            Cell::from(if user.created_via_management { "Yes" } else { "No" }),
            Cell::from(admin::format_last_activity(user.last_activity.as_deref())),
        ]);
        if user.is_disabled {
            row.style(Style::default().fg(Color::DarkGray))
        } else {
            row
        }
    });
    let widths = [
        Constraint::Percentage(18),
        Constraint::Length(9),
        Constraint::Length(13),
        Constraint::Percentage(14),
        Constraint::Percentage(24),
        Constraint::Length(9),
        Constraint::Length(14),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = TableState::default().with_selected((!view.users.is_empty()).then_some(view.user_cursor));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_plans(frame: &mut Frame, view: &AdminView, area: Rect) {
    let header = Row::new(["Name", "Price", "Interval", "Status", "Created", "Plan ID"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = view.plans.iter().map(|plan| {
        let created = plan
            .created_at()
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        Row::new(vec![
            Cell::from(plan.name.clone()),
            Cell::from(pricing::format_price(plan.price, &plan.currency)),
            Cell::from(plan.interval.to_string()),
            Cell::from(if plan.is_active { "Active" } else { "Inactive" }),
            Cell::from(created),
            Cell::from(plan.plan_id.clone()),
        ])
    });
    let widths = [
        Constraint::Percentage(22),
        Constraint::Length(12),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(11),
        Constraint::Min(10),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = TableState::default().with_selected((!view.plans.is_empty()).then_some(view.plan_cursor));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_plan_draft(frame: &mut Frame, app: &App, draft: &PlanDraft, area: Rect) {
    let mut lines = vec![heading("Create New Plan"), Line::raw("")];
    for (i, field) in PlanDraft::FIELDS.iter().enumerate() {
        let label = match field {
            Field::Name => "Name",
            Field::Description => "Details",
            _ => "Price",
        };
        lines.extend(input_lines(label, draft.value(*field), app.field == i, draft.errors.get(*field)));
    }
    let pickers = PlanDraft::FIELDS.len();
    lines.extend(input_lines(
        "Currency",
        &format!("◂ {} ▸", draft.currency.to_uppercase()),
        app.field == pickers,
        draft.errors.get(Field::Currency),
    ));
    lines.extend(input_lines(
        "Interval",
        &format!("◂ {} ▸", draft.interval.label()),
        app.field == pickers + 1,
        None,
    ));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}
