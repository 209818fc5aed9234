//! System tray icon and menu, driven by a winit event loop on the main thread.
//!
//! `TrayIcon` is not `Send`, so everything that touches it runs here. The
//! poller reaches the icon through [`TrayProxy`], which posts user events.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use tray_icon::menu::{Menu, MenuEvent, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};
use winit::application::ApplicationHandler;
use winit::event::{StartCause, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::WindowId;

use crate::config::KeepAwakeConfig;
use crate::platform::lock::DesktopLockProbe;
use crate::platform::power::PowercfgController;
use crate::platform::shell::ShellWatch;
use crate::schedule::LocalClock;
use crate::session::{Session, TrayHandle};
use crate::status::{GLYPH_SIZE, Glyph, TrayStatus};
use crate::tasks::poller::{self, PollerHandle};
use crate::tasks::shutdown::Shutdown;

const MENU_START: &str = "start";
const MENU_STOP: &str = "stop";
const MENU_FORCE: &str = "force";
const MENU_EXIT: &str = "exit";

/// Tray requests carry no status; the UI thread reads the current one from
/// the session when it handles them.
#[derive(Debug)]
pub enum UserEvent {
    Menu(MenuEvent),
    Refresh,
    Recreate,
}

/// Thread-safe handle the session uses to reach the tray.
pub struct TrayProxy {
    proxy: EventLoopProxy<UserEvent>,
    shell: Arc<ShellWatch>,
}

impl TrayProxy {
    fn post(&self, event: UserEvent) {
        if let Err(err) = self.proxy.send_event(event) {
            debug!(%err, "tray event loop already closed");
        }
    }
}

impl TrayHandle for TrayProxy {
    fn show(&self, status: &TrayStatus) {
        debug!(title = status.title, "tray refresh requested");
        self.post(UserEvent::Refresh);
    }

    fn is_alive(&self) -> bool {
        self.shell.is_same_shell()
    }

    fn recreate(&self, _status: &TrayStatus) {
        self.post(UserEvent::Recreate);
    }
}

struct TrayApp {
    session: Arc<Session>,
    shell: Arc<ShellWatch>,
    tray: Option<TrayIcon>,
    poller: Option<PollerHandle>,
    startup_error: Option<anyhow::Error>,
}

impl TrayApp {
    fn new(session: Arc<Session>, shell: Arc<ShellWatch>) -> Self {
        Self {
            session,
            shell,
            tray: None,
            poller: None,
            startup_error: None,
        }
    }

    fn rebuild(&mut self) {
        let status = self.session.status();
        // Drop the stale registration before adding a new one.
        self.tray = None;
        match build_tray(&status) {
            Ok(tray) => {
                self.tray = Some(tray);
                self.shell.record();
                info!(title = status.title, "tray icon created");
            }
            Err(err) => {
                self.shell.invalidate();
                error!("failed to create tray icon: {err:#}");
            }
        }
    }

    fn redraw(&self) {
        let status = self.session.status();
        let Some(tray) = &self.tray else {
            debug!(title = status.title, "no tray icon to update");
            return;
        };
        match glyph_icon(status.glyph) {
            Ok(icon) => {
                if let Err(err) = tray.set_icon(Some(icon)) {
                    warn!(%err, "failed to update tray icon");
                }
            }
            Err(err) => warn!("failed to render tray glyph: {err:#}"),
        }
        if let Err(err) = tray.set_tooltip(Some(&status.title)) {
            warn!(%err, "failed to update tray title");
        }
    }

    fn handle_menu(&mut self, event_loop: &ActiveEventLoop, id: &str) {
        debug!(id, "menu item selected");
        let status = match id {
            MENU_START => self.session.start(),
            MENU_STOP => self.session.stop(),
            MENU_FORCE => self.session.force(),
            MENU_EXIT => {
                let status = self.session.exit();
                event_loop.exit();
                status
            }
            other => {
                debug!(id = other, "ignoring unknown menu item");
                return;
            }
        };
        debug!(title = status.title, "menu action done");
        // Draw now; the Refresh queued by the session may not run after Exit.
        self.redraw();
    }
}

impl ApplicationHandler<UserEvent> for TrayApp {
    fn new_events(&mut self, event_loop: &ActiveEventLoop, cause: StartCause) {
        if !matches!(cause, StartCause::Init) {
            return;
        }
        self.rebuild();
        match poller::spawn(Arc::clone(&self.session)) {
            Ok(handle) => self.poller = Some(handle),
            Err(err) => {
                self.startup_error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, _event: WindowEvent) {
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Menu(event) => self.handle_menu(event_loop, event.id.0.as_str()),
            UserEvent::Refresh => self.redraw(),
            UserEvent::Recreate => {
                info!("restarting tray icon");
                self.rebuild();
            }
        }
    }
}

/// Run the tray until the user picks Exit, then stop the poller.
pub fn run(config: KeepAwakeConfig) -> Result<()> {
    let event_loop = EventLoop::<UserEvent>::with_user_event()
        .build()
        .context("failed to create tray event loop")?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let proxy = event_loop.create_proxy();
    MenuEvent::set_event_handler(Some({
        let proxy = proxy.clone();
        move |event| {
            let _ = proxy.send_event(UserEvent::Menu(event));
        }
    }));

    let shell = Arc::new(ShellWatch::new());
    let session = Arc::new(Session::new(
        config.clone(),
        Arc::new(PowercfgController::new(config.sleep_after_min)),
        Arc::new(DesktopLockProbe),
        Arc::new(LocalClock),
        Arc::new(TrayProxy {
            proxy,
            shell: Arc::clone(&shell),
        }),
        Shutdown::new(),
    ));

    let mut app = TrayApp::new(Arc::clone(&session), shell);
    let result = event_loop
        .run_app(&mut app)
        .context("tray event loop failed");

    session.shutdown().trigger();
    if let Some(poller) = app.poller.take() {
        poller.join()?;
    }
    if let Some(err) = app.startup_error.take() {
        return Err(err);
    }
    result
}

fn build_tray(status: &TrayStatus) -> Result<TrayIcon> {
    let menu = Menu::with_items(&[
        &MenuItem::with_id(MENU_START, "Start", true, None),
        &MenuItem::with_id(MENU_STOP, "Stop", true, None),
        &MenuItem::with_id(MENU_FORCE, "Force", true, None),
        &PredefinedMenuItem::separator(),
        &MenuItem::with_id(MENU_EXIT, "Exit", true, None),
    ])
    .context("failed to build tray menu")?;

    TrayIconBuilder::new()
        .with_menu(Box::new(menu))
        .with_tooltip(&status.title)
        .with_icon(glyph_icon(status.glyph)?)
        .build()
        .context("failed to register tray icon")
}

fn glyph_icon(glyph: Glyph) -> Result<Icon> {
    let image = glyph.render();
    Icon::from_rgba(image.into_raw(), GLYPH_SIZE, GLYPH_SIZE)
        .with_context(|| format!("invalid {glyph:?} glyph bitmap"))
}
