//! Line-oriented console front-end for an order list view.

use std::fmt::Write as _;
use std::str::FromStr;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::domain::filter::AssignmentFilter;
use crate::domain::types::{BatchId, OrderId, OrderStatus, TypeConstraintError, UserId};
use crate::dto::orders::QuerySnapshot;
use crate::forms::FormError;
use crate::forms::orders::FilterForm;
use crate::forms::validation::{FieldMapping, normalize_local};
use crate::repository::{OrderReader, OrderWriter};
use crate::services::orders::OrderQueryController;

pub const HELP: &str = "\
commands:
  search <text>          debounced search (empty text clears it)
  status [<status>]      filter by status, no argument clears it
  filter all|unassigned|mine
  page <n>               go to page n
  assign <order id>      assign an order to the acting user
  user [<id>]            set or clear the acting user
  batch [<id>]           set or clear the selected batch
  restore <query>        restore the filter from a query string
  url                    print the current filter as a query string
  refresh | show | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Status(Option<OrderStatus>),
    Filter(AssignmentFilter),
    Page(usize),
    Assign(OrderId),
    User(Option<UserId>),
    Batch(Option<BatchId>),
    Restore(String),
    Url,
    Refresh,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}`, type `help`")]
    Unknown(String),

    #[error("`{0}` expects {1}")]
    InvalidArgument(&'static str, &'static str),

    #[error(transparent)]
    TypeConstraint(#[from] TypeConstraintError),
}

fn parse_id(command: &'static str, raw: &str) -> Result<i32, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::InvalidArgument(command, "a numeric id"))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };

        let command = match (name, arg) {
            ("search", text) => Command::Search(text.to_string()),
            ("status", "") => Command::Status(None),
            ("status", status) => Command::Status(Some(OrderStatus::new(status)?)),
            ("filter", "all") => Command::Filter(AssignmentFilter::All),
            ("filter", "unassigned") => Command::Filter(AssignmentFilter::Unassigned),
            ("filter", "mine") => Command::Filter(AssignmentFilter::AssignedToMe),
            ("filter", _) => {
                return Err(CommandError::InvalidArgument(
                    "filter",
                    "one of all, unassigned, mine",
                ));
            }
            ("page", n) => Command::Page(
                n.parse()
                    .map_err(|_| CommandError::InvalidArgument("page", "a page number"))?,
            ),
            ("assign", id) => Command::Assign(OrderId::new(parse_id("assign", id)?)?),
            ("user", "") => Command::User(None),
            ("user", id) => Command::User(Some(UserId::new(parse_id("user", id)?)?)),
            ("batch", "") => Command::Batch(None),
            ("batch", id) => Command::Batch(Some(BatchId::new(parse_id("batch", id)?)?)),
            ("restore", query) => Command::Restore(query.to_string()),
            ("url", "") => Command::Url,
            ("refresh", "") => Command::Refresh,
            ("show", "") => Command::Show,
            ("help", "") => Command::Help,
            ("quit" | "exit", "") => Command::Quit,
            _ => return Err(CommandError::Unknown(line.to_string())),
        };
        Ok(command)
    }
}

/// Renders a snapshot as plain text.
pub fn render(snapshot: &QuerySnapshot) -> String {
    let mut out = String::new();

    if snapshot.is_initial_loading {
        out.push_str("loading orders...\n");
    }

    for order in &snapshot.items {
        let assignee = order
            .assigned_to
            .map_or_else(|| "-".to_string(), |user| user.to_string());
        let _ = writeln!(
            out,
            "#{:<5} {:<12} batch {:<4} user {:<4} {}",
            order.id.get(),
            order.status.as_str(),
            order.batch_id.get(),
            assignee,
            order.title.as_str(),
        );
    }

    let window: Vec<String> = snapshot
        .pages
        .iter()
        .map(|page| match page {
            Some(n) if *n == snapshot.current_page => format!("[{n}]"),
            Some(n) => n.to_string(),
            None => "…".to_string(),
        })
        .collect();
    let _ = write!(
        out,
        "page {}/{} ({} orders) {}",
        snapshot.current_page,
        snapshot.total_pages,
        snapshot.total_count,
        window.join(" ")
    );

    if snapshot.is_loading {
        out.push_str(" [loading]");
    }
    if let Some(error) = &snapshot.error {
        let _ = write!(out, "\nerror: {error}");
    }

    out
}

/// Prints the list after every committed response until aborted.
pub fn spawn_renderer<R>(controller: &OrderQueryController<R>) -> JoinHandle<()>
where
    R: OrderReader + OrderWriter + 'static,
{
    let controller = controller.clone();
    let mut commits = controller.subscribe();
    tokio::spawn(async move {
        while commits.changed().await.is_ok() {
            println!("{}", render(&controller.snapshot()));
        }
    })
}

fn announce(handle: Option<JoinHandle<bool>>) {
    if handle.is_none() {
        println!("waiting for view context (user/batch)");
    }
}

/// Applies one command to the controller. Results are printed by the task
/// from [`spawn_renderer`].
pub async fn execute<R>(controller: &OrderQueryController<R>, command: Command)
where
    R: OrderReader + OrderWriter + 'static,
{
    match command {
        Command::Search(text) => {
            println!("searching for `{text}`...");
            controller.set_search(text);
        }
        Command::Status(status) => announce(controller.set_status(status)),
        Command::Filter(assignment) => announce(controller.set_assignment_filter(assignment)),
        Command::Page(page) => announce(controller.set_page(page)),
        Command::User(user) => announce(controller.set_acting_user(user)),
        Command::Batch(batch) => announce(controller.set_batch(batch)),
        Command::Assign(order_id) => match controller.assign(order_id).await {
            Ok(()) => println!("order {order_id} assigned"),
            Err(e) => println!("assign failed: {e}"),
        },
        Command::Restore(query) => {
            let page_size = controller.filter().page_size();
            match FilterForm::from_query(&query).and_then(|form| form.into_filter(page_size)) {
                Ok(filter) => announce(controller.set_filter(filter)),
                Err(FormError::Validation(errors)) => {
                    for error in normalize_local(&errors, &FieldMapping::default()) {
                        println!("{}: {}", error.field, error.message);
                    }
                }
                Err(e) => println!("cannot restore filter: {e}"),
            }
        }
        Command::Url => match FilterForm::from(&controller.filter()).to_query() {
            Ok(query) => println!("?{query}"),
            Err(e) => println!("cannot encode filter: {e}"),
        },
        Command::Refresh => {
            let _ = controller.refetch().await;
        }
        Command::Show => println!("{}", render(&controller.snapshot())),
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}
