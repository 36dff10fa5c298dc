use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

use crate::db::Database;
use crate::ui::app::{App, InputMode, Screen};
use crate::ui::commands;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

pub(crate) fn as_tui(db: &mut Database) -> Result<()> {
    let mut app = App::new();
    app.refresh_all(db)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, db);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        tracing::error!(error = ?e, "tui exited with error");
        eprintln!("Error: {e:?}");
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    db: &mut Database,
) -> Result<()> {
    while app.running {
        terminal.draw(|f| {
            // tab bar, status bar, command bar, two borders and a table header
            let content_height = f.area().height.saturating_sub(6) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app);
        })?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.show_help {
                app.show_help = false;
                continue;
            }
            match app.input_mode {
                InputMode::Normal => handle_normal_input(key, app, db)?,
                InputMode::Command => handle_command_input(key, app, db)?,
                InputMode::Search => handle_search_input(key, app, db)?,
                InputMode::Editing => handle_editing_input(key, app, db)?,
                InputMode::Confirm => handle_confirm_input(key, app, db)?,
            }
        }
    }
    Ok(())
}

// ── Input handlers ───────────────────────────────────────────

fn handle_normal_input(key: KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char(':') => {
            app.input_mode = InputMode::Command;
            app.command_input.clear();
        }
        KeyCode::Char('/') => {
            if !app.screen.is_searchable() {
                switch_screen(app, db, Screen::Projects)?;
            }
            app.input_mode = InputMode::Search;
            app.search_input.clear();
        }
        KeyCode::Char('q') if ctrl => app.running = false,
        KeyCode::Char('d') if ctrl => {
            for _ in 0..app.visible_rows / 2 {
                move_down(app, db)?;
            }
        }
        KeyCode::Char('u') if ctrl => {
            for _ in 0..app.visible_rows / 2 {
                move_up(app, db)?;
            }
        }
        KeyCode::Char('j') | KeyCode::Down => move_down(app, db)?,
        KeyCode::Char('k') | KeyCode::Up => move_up(app, db)?,
        KeyCode::Char('g') => goto_top(app, db)?,
        KeyCode::Char('G') => goto_bottom(app, db)?,
        KeyCode::Char(c @ '1'..='5') => {
            let idx = c as usize - '1' as usize;
            if let Some(screen) = Screen::all().get(idx) {
                switch_screen(app, db, *screen)?;
            }
        }
        KeyCode::Tab => cycle_screen(app, db, 1)?,
        KeyCode::BackTab => cycle_screen(app, db, -1)?,
        KeyCode::Char('n') if app.screen == Screen::CostSharing => app.cycle_project(db, 1)?,
        KeyCode::Char('p') if app.screen == Screen::CostSharing => app.cycle_project(db, -1)?,
        KeyCode::Char('m') if app.screen == Screen::CostSharing => {
            commands::handle_command("mode", app, db)?;
        }
        KeyCode::Char('D') => commands::handle_command("delete", app, db)?,
        KeyCode::Enter if app.screen == Screen::Projects => {
            switch_screen(app, db, Screen::CostSharing)?;
        }
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Esc => {
            app.status_message.clear();
            if !app.search_input.is_empty() {
                app.search_input.clear();
                app.refresh_all(db)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn handle_command_input(key: KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            commands::handle_command(&input, app, db)?;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => app.command_input.push(c),
        _ => {}
    }
    Ok(())
}

fn handle_search_input(key: KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            return Ok(());
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.search_input.clear();
        }
        KeyCode::Backspace => {
            app.search_input.pop();
        }
        KeyCode::Char(c) => app.search_input.push(c),
        _ => return Ok(()),
    }
    // Live search: filter as you type
    reset_cursor(app);
    app.refresh_all(db)
}

fn handle_editing_input(key: KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let new_name = app.command_input.trim().to_string();
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
            if !new_name.is_empty() {
                commands::handle_command(&format!("rename {new_name}"), app, db)?;
            }
        }
        KeyCode::Esc => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
            app.set_status("Edit cancelled");
        }
        KeyCode::Backspace => {
            app.command_input.pop();
        }
        KeyCode::Char(c) => app.command_input.push(c),
        _ => {}
    }
    Ok(())
}

fn handle_confirm_input(key: KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    app.input_mode = InputMode::Normal;
    app.confirm_message.clear();
    let action = app.pending_action.take();

    match (key.code, action) {
        (KeyCode::Char('y') | KeyCode::Char('Y'), Some(action)) => {
            if let Err(e) = commands::run_pending(action, app, db) {
                match e.downcast_ref::<crate::error::DomainError>() {
                    Some(domain) => app.set_status(domain.to_string()),
                    None => return Err(e),
                }
            }
        }
        _ => app.set_status("Cancelled"),
    }
    Ok(())
}

// ── Navigation helpers ───────────────────────────────────────

fn switch_screen(app: &mut App, db: &mut Database, screen: Screen) -> Result<()> {
    if app.screen != screen {
        app.search_input.clear();
    }
    app.screen = screen;
    app.refresh_all(db)
}

fn cycle_screen(app: &mut App, db: &mut Database, delta: isize) -> Result<()> {
    let screens = Screen::all();
    let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0) as isize;
    let next = (idx + delta).rem_euclid(screens.len() as isize) as usize;
    switch_screen(app, db, screens[next])
}

fn reset_cursor(app: &mut App) {
    match app.screen {
        Screen::Customers => scroll_to_top(&mut app.customer_index, &mut app.customer_scroll),
        Screen::Projects => scroll_to_top(&mut app.project_index, &mut app.project_scroll),
        _ => {}
    }
}

fn move_down(app: &mut App, db: &mut Database) -> Result<()> {
    let page = app.visible_rows.max(1);
    match app.screen {
        Screen::Customers => scroll_down(
            &mut app.customer_index,
            &mut app.customer_scroll,
            app.customers.len(),
            page,
        ),
        Screen::Projects => {
            scroll_down(
                &mut app.project_index,
                &mut app.project_scroll,
                app.projects.len(),
                page,
            );
            app.refresh_selected_project(db)?;
        }
        Screen::CostSharing => {
            if app.allocation_index + 1 < app.allocations.len() {
                app.allocation_index += 1;
            }
        }
        _ => {}
    }
    Ok(())
}

fn move_up(app: &mut App, db: &mut Database) -> Result<()> {
    match app.screen {
        Screen::Customers => scroll_up(&mut app.customer_index, &mut app.customer_scroll),
        Screen::Projects => {
            scroll_up(&mut app.project_index, &mut app.project_scroll);
            app.refresh_selected_project(db)?;
        }
        Screen::CostSharing => app.allocation_index = app.allocation_index.saturating_sub(1),
        _ => {}
    }
    Ok(())
}

fn goto_top(app: &mut App, db: &mut Database) -> Result<()> {
    match app.screen {
        Screen::Customers => scroll_to_top(&mut app.customer_index, &mut app.customer_scroll),
        Screen::Projects => {
            scroll_to_top(&mut app.project_index, &mut app.project_scroll);
            app.refresh_selected_project(db)?;
        }
        Screen::CostSharing => app.allocation_index = 0,
        _ => {}
    }
    Ok(())
}

fn goto_bottom(app: &mut App, db: &mut Database) -> Result<()> {
    let page = app.visible_rows.max(1);
    match app.screen {
        Screen::Customers => scroll_to_bottom(
            &mut app.customer_index,
            &mut app.customer_scroll,
            app.customers.len(),
            page,
        ),
        Screen::Projects => {
            scroll_to_bottom(
                &mut app.project_index,
                &mut app.project_scroll,
                app.projects.len(),
                page,
            );
            app.refresh_selected_project(db)?;
        }
        Screen::CostSharing => app.allocation_index = app.allocations.len().saturating_sub(1),
        _ => {}
    }
    Ok(())
}
