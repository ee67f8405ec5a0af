use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, error, info, warn};

use dynalab_admin::config::{AppConfig, ConfigError};
use dynalab_admin::nav::{Route, RouteTracker};
use dynalab_admin::notify::{Notifier, TracingNotifier};
use dynalab_admin::pages::auth::{AuthPageController, AuthView, SubmitOutcome};
use dynalab_admin::pages::dashboard::{self, DashboardShell};
use dynalab_admin::provider::{AuthError, GoTrueProvider};
use dynalab_admin::services::auth::AuthService;
use dynalab_admin::services::work_orders::{DELETE_CONFIRM_PROMPT, LIST_TITLE, MockWorkOrders, RowAction, WorkOrderList};
use dynalab_admin::state::session::SessionStore;
use dynalab_admin::validate::{LoginForm, RegistrationForm};

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("auth provider: {0}")]
    Provider(#[from] AuthError),
    #[error("stdin: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "dynalab-admin", about = "Dynalab work-order admin shell")]
struct Cli {
    /// Dotenv file loaded before the environment is read.
    #[arg(long, env = "DYNALAB_ENV_FILE", default_value = ".env")]
    env_file: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let env_loaded = dotenvy::from_path(&cli.env_file).is_ok();
    tracing_subscriber::fmt::init();
    if !env_loaded {
        info!(path = %cli.env_file.display(), "no env file loaded; using process environment");
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "dynalab-admin failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    info!(?config, "starting");

    let provider = Arc::new(GoTrueProvider::new(&config)?);
    let store = SessionStore::new();
    if let Err(e) = store.initialize(&*provider).await {
        warn!(error = %e, "could not restore session; starting signed out");
    }
    store.spawn_auto_refresh(provider.clone());

    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let auth = Arc::new(AuthService::new(provider, store.clone(), notifier.clone()));
    let routes = Arc::new(RouteTracker::new(Route::LANDING));
    let orders = Arc::new(WorkOrderList::new(Arc::new(MockWorkOrders::new()), notifier));

    let mut shell = Shell {
        controller: AuthPageController::new(auth.clone(), routes.clone()),
        store,
        auth,
        routes,
        orders,
        dashboard: None,
        shown: None,
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    shell.sync();
    while let Some(line) = lines.next_line().await? {
        if !shell.dispatch(line.trim(), &mut lines).await? {
            break;
        }
        shell.sync();
    }

    shell.dashboard = None;
    shell.store.teardown();
    Ok(())
}

// =============================================================================
// SHELL
// =============================================================================

struct Shell {
    store: Arc<SessionStore>,
    auth: Arc<AuthService>,
    routes: Arc<RouteTracker>,
    orders: Arc<WorkOrderList>,
    controller: AuthPageController,
    dashboard: Option<DashboardShell>,
    shown: Option<Route>,
}

impl Shell {
    /// Bring the mounted page in line with the current route.
    fn sync(&mut self) {
        loop {
            match self.routes.current() {
                Route::Dashboard => {
                    if self.dashboard.is_none() {
                        self.dashboard = DashboardShell::mount(
                            self.store.clone(),
                            self.auth.clone(),
                            self.routes.clone(),
                            self.orders.clone(),
                        );
                        if self.dashboard.is_none() {
                            continue;
                        }
                    }
                }
                Route::Auth => {
                    self.dashboard = None;
                    if let AuthView::Redirect(_) = self.controller.render() {
                        continue;
                    }
                }
            }
            break;
        }
        self.banner();
    }

    fn banner(&mut self) {
        let route = self.routes.current();
        if self.shown == Some(route) {
            return;
        }
        self.shown = Some(route);
        match (&self.dashboard, route) {
            (Some(dash), Route::Dashboard) => {
                let who = dash.user_label().unwrap_or_default();
                println!("== {} ({who}) ==\n{}", dashboard::TITLE, dashboard::WELCOME);
            }
            _ => println!("== {route} =="),
        }
        print_help(route);
    }

    /// Run one command. Returns `Ok(false)` when the user asked to quit.
    async fn dispatch(&mut self, line: &str, lines: &mut Lines<BufReader<Stdin>>) -> Result<bool, AppError> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(true);
        };
        let route = self.routes.current();

        match (command, route) {
            ("quit" | "exit", _) => return Ok(false),
            ("help", _) => print_help(route),
            ("whoami", _) => self.whoami(),
            ("login", Route::Auth) => {
                let form = LoginForm {
                    email: words.next().unwrap_or_default().to_owned(),
                    password: words.next().unwrap_or_default().to_owned(),
                };
                report(self.controller.submit_login(&form).await);
            }
            ("register", Route::Auth) => {
                let email = words.next().unwrap_or_default().to_owned();
                let password = words.next().unwrap_or_default().to_owned();
                let full_name = words.collect::<Vec<_>>().join(" ");
                let form = RegistrationForm { full_name, email, password };
                report(self.controller.submit_registration(&form).await);
            }
            ("orders", Route::Dashboard) => self.list_orders().await,
            ("edit", Route::Dashboard) => {
                let Some(dash) = &self.dashboard else { return Ok(true) };
                match dash.edit_work_order(words.next().unwrap_or_default()).await {
                    Ok(order) => println!("editing {} ({} - {})", order.id, order.customer, order.work_title),
                    Err(e) => println!("{e}"),
                }
            }
            ("delete", Route::Dashboard) => {
                let id = words.next().unwrap_or_default().to_owned();
                println!("{DELETE_CONFIRM_PROMPT} [s/N]");
                let answer = lines.next_line().await?.unwrap_or_default();
                let confirmed = matches!(answer.trim().to_lowercase().as_str(), "s" | "si" | "sí" | "y" | "yes");
                let Some(dash) = &self.dashboard else { return Ok(true) };
                match dash.delete_work_order(&id, confirmed).await {
                    Ok(true) => println!("deleted {id}"),
                    Ok(false) => println!("cancelled"),
                    Err(e) => println!("{e}"),
                }
            }
            ("logout", Route::Dashboard) => {
                let Some(dash) = &self.dashboard else { return Ok(true) };
                // The notifier already showed the failure; stay on the dashboard.
                if let Err(e) = dash.sign_out().await {
                    debug!(error = %e, "sign-out failed");
                }
            }
            (other, _) => println!("unknown command `{other}` on {route}; try `help`"),
        }
        Ok(true)
    }

    async fn list_orders(&self) {
        let Some(dash) = &self.dashboard else { return };
        println!("{LIST_TITLE}");
        for row in dash.work_orders().await {
            let o = &row.order;
            let actions: Vec<&str> = row
                .actions
                .iter()
                .map(|a| match a {
                    RowAction::View => "view",
                    RowAction::Edit => "edit",
                    RowAction::Delete => "delete",
                })
                .collect();
            println!(
                "  {:<7} {} - {:<12} [{}] {:<6} ({})",
                o.id,
                o.customer,
                o.work_title,
                o.status.label(),
                o.priority.as_str(),
                actions.join(", ")
            );
        }
    }

    fn whoami(&self) {
        match self.store.current() {
            Some(session) => println!(
                "{} <{}> role={:?}",
                session.user.full_name().unwrap_or("-"),
                session.user.email.as_deref().unwrap_or("-"),
                session.role()
            ),
            None => println!("not signed in"),
        }
    }
}

fn report(outcome: SubmitOutcome) {
    match outcome {
        SubmitOutcome::Invalid(result) => {
            for (field, message) in &result.field_errors {
                println!("  {}: {message}", field.as_str());
            }
        }
        SubmitOutcome::Busy => println!("a request is already in progress"),
        // The notifier already showed the provider's message.
        SubmitOutcome::Failed(_) => {}
        SubmitOutcome::Completed(route) => println!("ok -> {route}"),
    }
}

fn print_help(route: Route) {
    match route {
        Route::Auth => {
            println!("  login <email> <password>");
            println!("  register <email> <password> <full name>");
        }
        Route::Dashboard => {
            println!("  orders | edit <id> | delete <id> | logout");
        }
    }
    println!("  whoami | help | quit");
}
