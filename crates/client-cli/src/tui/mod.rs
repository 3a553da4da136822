//! Full-screen navigation shell
//!
//! One view is mounted at a time under a shared nav bar and status line.
//! Backend calls run on spawned tasks and report back over a channel; the
//! session watcher feeds the nav bar.

mod app;
mod render;

pub use app::{App, AppMessage, Envelope, Page};

use std::io::{self, Stdout};

use crossterm::{
    event::{DisableFocusChange, EnableFocusChange, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, watch};

use crate::context::PortalContext;
use crate::nav::Route;
use crate::session::{SessionStatus, SessionWatcher};

/// Run the shell until the user quits. Returns the last external page the
/// user was handed off to, so the caller can print it once the terminal
/// is restored.
pub async fn run(ctx: PortalContext) -> io::Result<Option<String>> {
    let watcher = SessionWatcher::spawn(ctx.clone());
    let mut status_rx = watcher.subscribe();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut app = App::new(ctx, tx);
    app.set_status(watcher.current());
    app.navigate(Route::Welcome);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, &mut app, &mut rx, &mut status_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result?;

    Ok(app.handoff().map(str::to_string))
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    rx: &mut mpsc::UnboundedReceiver<Envelope>,
    status_rx: &mut watch::Receiver<SessionStatus>,
) -> io::Result<()> {
    let mut events = EventStream::new();

    while !app.should_quit() {
        terminal.draw(|f| render::draw(f, app))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => app.handle_event(event),
                Some(Err(e)) => return Err(e),
                None => break,
            },
            Some((generation, msg)) = rx.recv() => app.handle_message(generation, msg),
            Ok(()) = status_rx.changed() => {
                let status = *status_rx.borrow_and_update();
                app.set_status(status);
            }
        }
    }

    Ok(())
}
