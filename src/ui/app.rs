use anyhow::Result;

use crate::alloc;
use crate::db::Database;
use crate::models::*;
use crate::report::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Dashboard,
    Customers,
    Projects,
    CostSharing,
    Reports,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[
            Self::Dashboard,
            Self::Customers,
            Self::Projects,
            Self::CostSharing,
            Self::Reports,
        ]
    }

    /// Screens that show a searchable list.
    pub(crate) fn is_searchable(self) -> bool {
        matches!(self, Self::Customers | Self::Projects)
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dashboard => write!(f, "Dashboard"),
            Self::Customers => write!(f, "Customers"),
            Self::Projects => write!(f, "Projects"),
            Self::CostSharing => write!(f, "Cost Sharing"),
            Self::Reports => write!(f, "Reports"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Search,
    Editing,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Search => write!(f, "SEARCH"),
            Self::Editing => write!(f, "EDIT"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// How the value given to `:link` is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkMode {
    Percent,
    Amount,
}

impl LinkMode {
    pub(crate) fn toggle(self) -> Self {
        match self {
            Self::Percent => Self::Amount,
            Self::Amount => Self::Percent,
        }
    }
}

impl std::fmt::Display for LinkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Percent => write!(f, "percent"),
            Self::Amount => write!(f, "amount"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PendingAction {
    DeleteCustomer { id: i64, name: String },
    DeleteProject { id: i64, name: String },
    DeleteExpense { id: i64, label: String },
    Unlink {
        project_id: i64,
        customer_id: i64,
        name: String,
    },
    Reset,
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) search_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,

    // Dashboard / Reports
    pub(crate) report: Report,

    // Customers
    pub(crate) customers: Vec<Customer>,
    pub(crate) customer_index: usize,
    pub(crate) customer_scroll: usize,

    // Projects
    pub(crate) projects: Vec<Project>,
    pub(crate) project_index: usize,
    pub(crate) project_scroll: usize,
    pub(crate) project_expenses: Vec<Expense>,

    // Cost sharing, for the selected project
    pub(crate) allocations: Vec<ProjectCustomer>,
    pub(crate) allocation_index: usize,
    pub(crate) overview: Option<ProjectCostOverview>,
    pub(crate) link_mode: LinkMode,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new() -> Self {
        Self {
            running: true,
            screen: Screen::Dashboard,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            search_input: String::new(),
            status_message: String::new(),
            show_help: false,

            report: Report::default(),

            customers: Vec::new(),
            customer_index: 0,
            customer_scroll: 0,

            projects: Vec::new(),
            project_index: 0,
            project_scroll: 0,
            project_expenses: Vec::new(),

            allocations: Vec::new(),
            allocation_index: 0,
            overview: None,
            link_mode: LinkMode::Percent,

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
        }
    }

    fn search_filter(&self) -> Option<String> {
        let s = self.search_input.trim().to_lowercase();
        (!s.is_empty()).then_some(s)
    }

    pub(crate) fn refresh_dashboard(&mut self, db: &Database) -> Result<()> {
        self.report = Report::build(db)?;
        Ok(())
    }

    pub(crate) fn refresh_customers(&mut self, db: &Database) -> Result<()> {
        let mut customers = db.get_customers()?;
        if self.screen == Screen::Customers {
            if let Some(needle) = self.search_filter() {
                customers.retain(|c| matches_search(&c.name, c.description.as_deref(), &needle));
            }
        }
        self.customers = customers;
        clamp_index(&mut self.customer_index, self.customers.len());
        Ok(())
    }

    pub(crate) fn refresh_projects(&mut self, db: &Database) -> Result<()> {
        let mut projects = db.get_projects()?;
        if self.screen == Screen::Projects {
            if let Some(needle) = self.search_filter() {
                projects.retain(|p| matches_search(&p.name, p.description.as_deref(), &needle));
            }
        }
        self.projects = projects;
        clamp_index(&mut self.project_index, self.projects.len());
        self.refresh_selected_project(db)
    }

    /// Reload expenses, allocations and the cost overview of the selected project.
    pub(crate) fn refresh_selected_project(&mut self, db: &Database) -> Result<()> {
        match self.selected_project_id() {
            Some(id) => {
                self.project_expenses = db.get_project_expenses(id)?;
                self.allocations = db.get_project_customers(id)?;
                self.overview = Some(db.get_project_cost_overview(id)?);
            }
            None => {
                self.project_expenses.clear();
                self.allocations.clear();
                self.overview = None;
            }
        }
        clamp_index(&mut self.allocation_index, self.allocations.len());
        Ok(())
    }

    pub(crate) fn refresh_all(&mut self, db: &Database) -> Result<()> {
        self.refresh_dashboard(db)?;
        self.refresh_customers(db)?;
        self.refresh_projects(db)?;
        Ok(())
    }

    pub(crate) fn selected_customer(&self) -> Option<&Customer> {
        self.customers.get(self.customer_index)
    }

    pub(crate) fn selected_project(&self) -> Option<&Project> {
        self.projects.get(self.project_index)
    }

    pub(crate) fn selected_project_id(&self) -> Option<i64> {
        self.selected_project().and_then(|p| p.id)
    }

    pub(crate) fn selected_allocation(&self) -> Option<&ProjectCustomer> {
        self.allocations.get(self.allocation_index)
    }

    /// Total expenses of the selected project as shown in the overview.
    pub(crate) fn selected_project_total(&self) -> f64 {
        self.overview
            .as_ref()
            .map(|o| alloc::to_f64(o.total_expenses))
            .unwrap_or(0.0)
    }

    /// Percentage a `:link`/`:share` value stands for on the selected project.
    ///
    /// In amount mode the value is converted through the project total. The
    /// result is clamped to 0..=100 and refused when it would push the
    /// project over 100%; `replacing` names an allocation being changed, whose
    /// current share does not count.
    pub(crate) fn link_percentage(
        &self,
        value: f64,
        replacing: Option<i64>,
    ) -> std::result::Result<f64, String> {
        let pct = match self.link_mode {
            LinkMode::Percent => value,
            LinkMode::Amount => {
                let total = self.selected_project_total();
                if total <= 0.0 {
                    return Err("Project has no expenses yet; link by percent".into());
                }
                alloc::amount_to_percentage(total, value)
            }
        };
        let pct = alloc::clamp_percentage(pct);
        if pct <= 0.0 {
            return Err("Share must be greater than 0".into());
        }

        let others: Vec<&ProjectCustomer> = self
            .allocations
            .iter()
            .filter(|a| Some(a.customer_id) != replacing)
            .collect();
        if !alloc::can_allocate(&others, pct) {
            return Err(format!(
                "Allocation exceeds 100% ({:.2}% left)",
                alloc::remaining_percentage(&others)
            ));
        }
        Ok(pct)
    }

    /// Move the project selection by `delta`, wrapping around.
    pub(crate) fn cycle_project(&mut self, db: &Database, delta: isize) -> Result<()> {
        if self.projects.is_empty() {
            return Ok(());
        }
        let len = self.projects.len() as isize;
        self.project_index = (self.project_index as isize + delta).rem_euclid(len) as usize;
        self.allocation_index = 0;
        self.refresh_selected_project(db)?;
        if let Some(project) = self.selected_project() {
            let name = project.name.clone();
            self.set_status(format!("Project: {name}"));
        }
        Ok(())
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }
}

fn matches_search(name: &str, description: Option<&str>, needle: &str) -> bool {
    name.to_lowercase().contains(needle)
        || description.is_some_and(|d| d.to_lowercase().contains(needle))
}

fn clamp_index(index: &mut usize, len: usize) {
    if *index >= len {
        *index = len.saturating_sub(1);
    }
}
