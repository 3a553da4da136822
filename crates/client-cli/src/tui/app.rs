//! Navigation shell state and input handling

use std::future::Future;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use shared::{AccountInfo, MessageResponse, Plan, SignupResponse, ToggleStatusResponse};
use tokio::sync::mpsc::UnboundedSender;

use crate::context::PortalContext;
use crate::error::PortalError;
use crate::nav::{self, NavLink, Route};
use crate::session::{SessionSignal, SessionStatus};
use crate::validation::Field;
use crate::views::account::{self, AccountView};
use crate::views::admin::{self, AdminData, AdminTab, AdminView, PendingAction, PlanDraft};
use crate::views::login::{self, LoginForm};
use crate::views::pricing::{self, BillingCycle, PricingView};
use crate::views::signup::SignupForm;
use crate::views::{Navigation, Notice};

/// Result of a spawned backend command
#[derive(Debug)]
pub enum AppMessage {
    Catalog(Result<Vec<Plan>, PortalError>),
    LoginDone(Result<(), PortalError>),
    SignupDone(Result<SignupResponse, PortalError>),
    AccountLoaded(Result<AccountInfo, PortalError>),
    SignedOut(Navigation),
    AdminLoaded(Result<AdminData, PortalError>),
    UserToggled(String, Result<ToggleStatusResponse, PortalError>),
    UserRemoved(String, Result<(), PortalError>),
    PlanChanged(Result<MessageResponse, PortalError>, &'static str),
    PlanCreated(Result<MessageResponse, PortalError>),
}

/// A command result stamped with the mount generation that asked for it
pub type Envelope = (u64, AppMessage);

/// The mounted view
#[derive(Debug)]
pub enum Page {
    /// Landing page; keeps the catalog for its starting price
    Welcome(PricingView),
    Signup(SignupForm),
    Login(LoginForm),
    Account(AccountView),
    Setup,
    Support,
    Pricing(PricingView),
    Admin(AdminView),
}

/// Runs commands for the current mount. Results carry the generation so
/// the app can drop anything that lands after the user moved on.
#[derive(Clone)]
struct Spawner {
    ctx: PortalContext,
    tx: UnboundedSender<Envelope>,
    generation: u64,
}

impl Spawner {
    fn spawn<F, Fut>(&self, command: F)
    where
        F: FnOnce(PortalContext) -> Fut,
        Fut: Future<Output = AppMessage> + Send + 'static,
    {
        let tx = self.tx.clone();
        let generation = self.generation;
        let fut = command(self.ctx.clone());
        tokio::spawn(async move {
            let msg = fut.await;
            if tx.send((generation, msg)).is_err() {
                tracing::trace!("Shell is gone, dropping command result");
            }
        });
    }

    fn load_admin(&self) {
        self.spawn(|ctx| async move {
            AppMessage::AdminLoaded(admin::fetch_admin_data(&ctx).await)
        });
    }
}

/// Navigation shell state
pub struct App {
    ctx: PortalContext,
    tx: UnboundedSender<Envelope>,
    pub(super) status: SessionStatus,
    pub(super) route: Route,
    pub(super) page: Page,
    /// Bumped on every route change
    generation: u64,
    /// Focused form field
    pub(super) field: usize,
    pub(super) scroll: u16,
    pub(super) notice: Option<Notice>,
    /// Plan handed from the pricing page to the signup form
    preselect: Option<String>,
    /// Last page handed off outside the client
    pub(super) handoff: Option<String>,
    pub(super) should_quit: bool,
}

impl App {
    pub fn new(ctx: PortalContext, tx: UnboundedSender<Envelope>) -> Self {
        Self {
            ctx,
            tx,
            status: SessionStatus::GUEST,
            route: Route::Welcome,
            page: Page::Setup,
            generation: 0,
            field: 0,
            scroll: 0,
            notice: None,
            preselect: None,
            handoff: None,
            should_quit: false,
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn handoff(&self) -> Option<&str> {
        self.handoff.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn links(&self) -> Vec<NavLink> {
        nav::links_for(self.status)
    }

    pub fn set_status(&mut self, status: SessionStatus) {
        if self.status != status {
            tracing::debug!("Session status now {:?}", status);
        }
        self.status = status;
    }

    fn spawner(&self) -> Spawner {
        Spawner {
            ctx: self.ctx.clone(),
            tx: self.tx.clone(),
            generation: self.generation,
        }
    }

    /// Mount `route`, starting whatever it loads on mount
    pub fn navigate(&mut self, route: Route) {
        self.generation += 1;
        self.route = route;
        self.field = 0;
        self.scroll = 0;
        self.notice = None;
        if route != Route::Signup {
            self.preselect = None;
        }

        let spawner = self.spawner();
        let load_catalog = || {
            spawner.spawn(|ctx| async move {
                AppMessage::Catalog(pricing::load_catalog(&ctx).await)
            });
        };
        self.page = match route {
            Route::Welcome => {
                load_catalog();
                Page::Welcome(PricingView::new())
            }
            Route::Pricing => {
                load_catalog();
                Page::Pricing(PricingView::new())
            }
            Route::Signup => {
                load_catalog();
                Page::Signup(SignupForm::new())
            }
            Route::Login => Page::Login(LoginForm::new()),
            Route::Account => {
                spawner.spawn(|ctx| async move {
                    AppMessage::AccountLoaded(account::fetch_account(&ctx).await)
                });
                Page::Account(AccountView::new())
            }
            Route::Admin => {
                spawner.load_admin();
                Page::Admin(AdminView::new())
            }
            Route::Setup => Page::Setup,
            Route::Support => Page::Support,
        };
        tracing::debug!("Mounted {} (generation {})", route, self.generation);
    }

    fn follow(&mut self, navigation: Navigation) {
        match navigation {
            Navigation::Route(route) => self.navigate(route),
            Navigation::External(url) => {
                tracing::info!("Handing off to {}", url);
                self.notice = Some(Notice::info(format!("Continue in your browser: {}", url)));
                self.handoff = Some(url);
            }
        }
    }

    fn step_link(&mut self, forward: bool) {
        let links = self.links();
        if links.is_empty() {
            return;
        }
        let len = links.len();
        let next = match links.iter().position(|l| l.route == self.route) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        self.navigate(links[next].route);
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::FocusGained => self.ctx.bus.publish(SessionSignal::FocusGained),
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => self.should_quit = true,
                KeyCode::Char('n') => self.step_link(true),
                KeyCode::Char('p') => self.step_link(false),
                _ => {}
            }
            return;
        }

        let spawner = self.spawner();
        let navigation = match &mut self.page {
            Page::Welcome(_) => match key.code {
                KeyCode::Char('p') | KeyCode::Enter => Some(Navigation::Route(Route::Pricing)),
                KeyCode::Char('s') if !self.status.authenticated => {
                    Some(Navigation::Route(Route::Signup))
                }
                KeyCode::Char('l') if !self.status.authenticated => {
                    Some(Navigation::Route(Route::Login))
                }
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    None
                }
                _ => None,
            },
            Page::Setup | Page::Support => {
                match key.code {
                    KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
                    KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
                    KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
                    KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
                    _ => {}
                }
                None
            }
            Page::Login(form) => {
                let fields = LoginForm::FIELDS;
                match key.code {
                    KeyCode::Tab | KeyCode::Down => self.field = (self.field + 1) % fields.len(),
                    KeyCode::BackTab | KeyCode::Up => {
                        self.field = (self.field + fields.len() - 1) % fields.len()
                    }
                    KeyCode::Char(c) => form.push_char(fields[self.field], c),
                    KeyCode::Backspace => form.pop_char(fields[self.field]),
                    KeyCode::Enter => {
                        if let Some(credentials) = form.begin_submit() {
                            spawner.spawn(|ctx| async move {
                                AppMessage::LoginDone(login::login(&ctx, &credentials).await)
                            });
                        }
                    }
                    _ => {}
                }
                None
            }
            Page::Signup(form) => {
                let fields = SignupForm::FIELDS;
                let field = fields[self.field];
                match key.code {
                    KeyCode::Tab | KeyCode::Down => self.field = (self.field + 1) % fields.len(),
                    KeyCode::BackTab | KeyCode::Up => {
                        self.field = (self.field + fields.len() - 1) % fields.len()
                    }
                    KeyCode::Left if field == Field::Plan => form.select_prev_plan(),
                    KeyCode::Right if field == Field::Plan => form.select_next_plan(),
                    KeyCode::Char(' ') if field == Field::Plan => form.select_next_plan(),
                    KeyCode::Char(c) if field != Field::Plan => form.push_char(field, c),
                    KeyCode::Backspace if field != Field::Plan => form.pop_char(field),
                    KeyCode::Enter => {
                        if let Some(req) = form.begin_submit() {
                            spawner.spawn(|ctx| async move {
                                AppMessage::SignupDone(ctx.client.signup(&req).await)
                            });
                        }
                    }
                    _ => {}
                }
                None
            }
            Page::Account(view) => match key.code {
                KeyCode::Char('b') => {
                    let handoff = view.billing_portal();
                    if handoff.is_none() && view.account.is_some() {
                        self.notice = Some(Notice::info("No billing portal available"));
                    }
                    handoff
                }
                KeyCode::Char('o') => {
                    view.begin_sign_out();
                    spawner.spawn(|ctx| async move {
                        AppMessage::SignedOut(account::sign_out(&ctx).await)
                    });
                    None
                }
                KeyCode::Char('r') => {
                    view.loading = true;
                    spawner.spawn(|ctx| async move {
                        AppMessage::AccountLoaded(account::fetch_account(&ctx).await)
                    });
                    None
                }
                _ => None,
            },
            Page::Pricing(view) => match key.code {
                KeyCode::Char('m') => {
                    view.set_cycle(BillingCycle::Monthly);
                    None
                }
                KeyCode::Char('y') => {
                    view.set_cycle(BillingCycle::Yearly);
                    None
                }
                KeyCode::Tab => {
                    view.set_cycle(view.cycle.toggled());
                    None
                }
                KeyCode::Left | KeyCode::Up => {
                    view.move_cursor(-1);
                    None
                }
                KeyCode::Right | KeyCode::Down => {
                    view.move_cursor(1);
                    None
                }
                KeyCode::Enter => view.select_plan().map(|plan_id| {
                    self.preselect = Some(plan_id);
                    Navigation::Route(Route::Signup)
                }),
                _ => None,
            },
            Page::Admin(view) => {
                handle_admin_key(view, &mut self.field, key, &spawner);
                None
            }
        };

        if let Some(navigation) = navigation {
            self.follow(navigation);
        }
    }

    /// Fold a command result into the mounted view. Results from an
    /// earlier mount are dropped.
    pub fn handle_message(&mut self, generation: u64, msg: AppMessage) {
        if generation != self.generation {
            tracing::debug!("Dropping stale result from generation {}", generation);
            return;
        }

        let spawner = self.spawner();
        let mut notice = None;
        let navigation = match (&mut self.page, msg) {
            (Page::Welcome(view) | Page::Pricing(view), AppMessage::Catalog(result)) => {
                view.apply_catalog(result);
                None
            }
            (Page::Signup(form), AppMessage::Catalog(result)) => {
                let plans = result.unwrap_or_else(|e| {
                    tracing::warn!("Failed to fetch plans: {}", e);
                    Vec::new()
                });
                form.set_plans(plans, self.preselect.take().as_deref());
                None
            }
            (Page::Signup(form), AppMessage::SignupDone(result)) => {
                let navigation = form.apply_result(result);
                if let Some(password) = &form.temporary_password {
                    notice = Some(Notice::success(format!("Temporary password: {}", password)));
                }
                navigation
            }
            (Page::Login(form), AppMessage::LoginDone(result)) => form.apply_result(result),
            (Page::Account(view), AppMessage::AccountLoaded(result)) => {
                let navigation = view.apply_fetch(result);
                notice = view.notice.take();
                navigation
            }
            (Page::Account(_), AppMessage::SignedOut(navigation)) => Some(navigation),
            (Page::Admin(view), AppMessage::AdminLoaded(result)) => {
                view.apply_data(result);
                None
            }
            (Page::Admin(view), AppMessage::UserToggled(username, result)) => {
                view.apply_user_toggled(&username, result);
                None
            }
            (Page::Admin(view), AppMessage::UserRemoved(username, result)) => {
                if view.apply_user_removed(&username, result) {
                    spawner.load_admin();
                }
                None
            }
            (Page::Admin(view), AppMessage::PlanChanged(result, fallback)) => {
                if view.apply_plan_change(result, fallback) {
                    spawner.load_admin();
                }
                None
            }
            (Page::Admin(view), AppMessage::PlanCreated(result)) => {
                if view.apply_plan_created(result) {
                    self.field = 0;
                    spawner.load_admin();
                }
                None
            }
            (_, msg) => {
                tracing::debug!("Result {:?} does not apply to {}", msg, self.route);
                None
            }
        };

        if let Some(navigation) = navigation {
            self.follow(navigation);
        }
        // After following, so a redirect keeps the reason it happened
        if let Some(notice) = notice {
            self.notice = Some(notice);
        }
    }
}

/// Admin keys: the plan editor and confirmations take precedence over
/// the list shortcuts.
fn handle_admin_key(view: &mut AdminView, field: &mut usize, key: KeyEvent, spawner: &Spawner) {
    if let Some(draft) = view.draft.as_mut() {
        // Name, description, price, then the currency and interval pickers
        const POSITIONS: usize = PlanDraft::FIELDS.len() + 2;
        match key.code {
            KeyCode::Esc => {
                view.draft = None;
                *field = 0;
            }
            KeyCode::Tab | KeyCode::Down => *field = (*field + 1) % POSITIONS,
            KeyCode::BackTab | KeyCode::Up => *field = (*field + POSITIONS - 1) % POSITIONS,
            KeyCode::Enter => match draft.to_request() {
                Ok(req) => {
                    spawner.spawn(|ctx| async move {
                        AppMessage::PlanCreated(admin::create_plan(&ctx, &req).await)
                    });
                }
                Err(e) => view.notice = Some(Notice::error(e.to_string())),
            },
            code => match PlanDraft::FIELDS.get(*field) {
                Some(&f) => match code {
                    KeyCode::Char(c) => draft.push_char(f, c),
                    KeyCode::Backspace => draft.pop_char(f),
                    _ => {}
                },
                None if matches!(code, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) => {
                    if *field == PlanDraft::FIELDS.len() {
                        draft.cycle_currency();
                    } else {
                        draft.cycle_interval();
                    }
                }
                None => {}
            },
        }
        return;
    }

    if view.pending.is_some() {
        let confirmed = view.confirm(matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')));
        match confirmed {
            Some(PendingAction::DeleteUser(username)) => spawner.spawn(|ctx| async move {
                let result = admin::delete_user(&ctx, &username).await;
                AppMessage::UserRemoved(username, result)
            }),
            Some(PendingAction::ArchivePlan(plan_id)) => spawner.spawn(|ctx| async move {
                let result = admin::archive_plan(&ctx, &plan_id).await;
                AppMessage::PlanChanged(result, "Failed to archive plan")
            }),
            None => view.notice = Some(Notice::info("Cancelled")),
        }
        return;
    }

    match key.code {
        KeyCode::Char('u') => view.set_tab(AdminTab::Users),
        KeyCode::Char('p') => view.set_tab(AdminTab::Plans),
        KeyCode::Up => view.move_cursor(-1),
        KeyCode::Down => view.move_cursor(1),
        KeyCode::Char('r') => {
            view.loading = true;
            spawner.load_admin();
        }
        KeyCode::Char('e') if view.tab == AdminTab::Users => {
            if let Some(username) = view.actionable_user().map(|u| u.username.clone()) {
                spawner.spawn(|ctx| async move {
                    let result = admin::toggle_user(&ctx, &username).await;
                    AppMessage::UserToggled(username, result)
                });
            }
        }
        KeyCode::Char('d') if view.tab == AdminTab::Users => view.request_delete_user(),
        KeyCode::Char('n') if view.tab == AdminTab::Plans => {
            view.draft = Some(PlanDraft::default());
            *field = 0;
        }
        KeyCode::Char('a') if view.tab == AdminTab::Plans => {
            let selected = view.selected_plan().map(|p| (p.plan_id.clone(), p.is_active));
            if let Some((plan_id, active)) = selected {
                spawner.spawn(|ctx| async move {
                    let result = admin::toggle_plan(&ctx, &plan_id, active).await;
                    AppMessage::PlanChanged(result, "Failed to update plan")
                });
            }
        }
        KeyCode::Char('x') if view.tab == AdminTab::Plans => view.request_archive_plan(),
        _ => {}
    }
}
