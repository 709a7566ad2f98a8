use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseButton,
    MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::{Frame, Terminal};

use crate::config::{self, Config};
use crate::store;
use crate::tree::history::NavigationHistory;
use crate::tree::loader::{self, LoadError};
use crate::tree::model::{Children, NodePath, Toggle, TreeNode};
use crate::tui::anim::{self, AnimationPlan, Snapshots};
use crate::tui::input::{self, Action, Direction};
use crate::tui::layout::{self, HEIGHT, PlacedNode};
use crate::tui::render::{self, HitBox, RenderData};
use crate::tui::settings::{self, SettingsEvent, SettingsPanelState};

/// Where the very first transition of a document grows from, matching the
/// original canvas: vertically centered at the left edge.
const INITIAL_SOURCE: (f64, f64) = (HEIGHT / 2.0, 0.0);

/// Tick while something is in flight vs. idle polling.
const FAST_TICK: Duration = Duration::from_millis(33);
const IDLE_TICK: Duration = Duration::from_millis(200);

struct PendingLoad {
    ply: u32,
    prev_ply: u32,
    rx: mpsc::Receiver<Result<TreeNode, LoadError>>,
}

struct ViewerState {
    demo: bool,
    data_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    config: Config,
    root: Option<TreeNode>,
    history: NavigationHistory,
    current_ply: u32,
    focused: NodePath,
    snapshots: Snapshots,
    anim: Option<AnimationPlan>,
    last_placed: Vec<PlacedNode>,
    pending_load: Option<PendingLoad>,
    status_message: Option<String>,
    show_help: bool,
    show_settings: bool,
    settings_state: SettingsPanelState,
    hit_boxes: Vec<HitBox>,
}

impl ViewerState {
    fn load(demo: bool, data_dir: Option<PathBuf>, ply: Option<u32>) -> Result<Self> {
        let mut app = Self {
            demo,
            data_dir: None,
            config_path: None,
            config: Config::default(),
            root: None,
            history: NavigationHistory::new(""),
            current_ply: 0,
            focused: NodePath::new(),
            snapshots: Snapshots::default(),
            anim: None,
            last_placed: Vec::new(),
            pending_load: None,
            status_message: None,
            show_help: false,
            show_settings: false,
            settings_state: SettingsPanelState::default(),
            hit_boxes: Vec::new(),
        };

        if demo {
            app.current_ply = ply.unwrap_or(0).min(app.config.max_ply);
            app.apply_loaded(demo_tree(app.current_ply));
            app.status_message = Some("demo mode: built-in sample tree".to_string());
            return Ok(app);
        }

        let dir = store::resolve_data_dir(data_dir)?;
        let config_path = store::config_path(&dir);
        app.config = config::load(&config_path)?;
        app.current_ply = ply.unwrap_or(0).min(app.config.max_ply);

        let root = loader::load_ply(&dir, app.current_ply, app.config.max_ply)
            .with_context(|| format!("failed to load ply {}", app.current_ply))?;
        app.data_dir = Some(dir);
        app.config_path = Some(config_path);
        app.apply_loaded(root);
        Ok(app)
    }

    /// Install a freshly loaded document: new history, new layout, every
    /// element entering from the initial source point.
    fn apply_loaded(&mut self, root: TreeNode) {
        self.history.reset(root.board.as_str());
        self.root = Some(root);
        self.focused = NodePath::new();
        self.snapshots = Snapshots::default();
        self.status_message = None;
        self.replan(&[]);
    }

    /// Recompute the layout and start a transition whose enter/exit elements
    /// are anchored at `source_path` (the toggled node).
    fn replan(&mut self, source_path: &[usize]) {
        let Some(root) = self.root.as_ref() else {
            return;
        };
        let placed = layout::compute(root);
        let source_old = self
            .snapshots
            .nodes
            .get(source_path)
            .map(|s| s.pos)
            .unwrap_or(INITIAL_SOURCE);
        let source_new = placed
            .iter()
            .find(|p| p.path == source_path)
            .map(|p| (p.x, p.y))
            .unwrap_or(source_old);

        let duration = Duration::from_millis(self.config.duration_ms);
        let (plan, next) = anim::plan(&placed, &self.snapshots, source_old, source_new, duration);
        self.anim = Some(plan);
        self.snapshots = next;

        if !placed.iter().any(|p| p.path == self.focused) {
            self.focused = source_path.to_vec();
        }
        self.last_placed = placed;
    }

    /// Toggle the node at `path`: expand pushes its board onto the history,
    /// collapse pops (except for the root). Leaves are ignored.
    fn toggle_at(&mut self, path: &[usize]) {
        let expanded_board = {
            let Some(root) = self.root.as_mut() else {
                return;
            };
            let Some(node) = root.node_at_mut(path) else {
                return;
            };
            match node.toggle() {
                Toggle::Leaf => return,
                Toggle::Expanded => Some(node.board.clone()),
                Toggle::Collapsed => None,
            }
        };
        match expanded_board {
            Some(board) => self.history.push(board),
            None => {
                if !path.is_empty() {
                    self.history.pop();
                }
            }
        }
        self.focused = path.to_vec();
        self.replan(path);
    }

    fn expand_all(&mut self) {
        let Some(root) = self.root.as_mut() else {
            return;
        };
        root.expand_recursive();
        self.replan(&[]);
    }

    /// Step the ply counter, clamped to `[0, max_ply]`. The current tree is
    /// fully collapsed as a visual reset, then the new document is requested
    /// in the background; a result arriving for a superseded ply is dropped.
    fn change_ply(&mut self, forward: bool) {
        let target = if forward {
            if self.current_ply >= self.config.max_ply {
                return;
            }
            self.current_ply + 1
        } else {
            if self.current_ply == 0 {
                return;
            }
            self.current_ply - 1
        };

        if let Some(root) = self.root.as_mut() {
            root.collapse_recursive();
        }
        self.replan(&[]);

        let prev_ply = self.current_ply;
        self.current_ply = target;

        if self.demo {
            self.apply_loaded(demo_tree(target));
            return;
        }
        let Some(dir) = self.data_dir.clone() else {
            return;
        };
        let max_ply = self.config.max_ply;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(loader::load_ply(&dir, target, max_ply));
        });
        self.pending_load = Some(PendingLoad {
            ply: target,
            prev_ply,
            rx,
        });
    }

    /// Pick up a finished background load, if any. Failures keep the old
    /// tree and roll the ply counter back.
    fn drain_pending(&mut self) {
        let outcome = match &self.pending_load {
            None => return,
            Some(pending) => match pending.rx.try_recv() {
                Err(mpsc::TryRecvError::Empty) => return,
                Err(mpsc::TryRecvError::Disconnected) => None,
                Ok(result) => Some(result),
            },
        };
        let pending = self
            .pending_load
            .take()
            .expect("pending load checked above");
        let Some(result) = outcome else {
            return;
        };
        if pending.ply != self.current_ply {
            return;
        }
        match result {
            Ok(root) => self.apply_loaded(root),
            Err(err) => {
                self.current_ply = pending.prev_ply;
                self.status_message = Some(err.to_string());
            }
        }
    }

    fn is_busy(&self) -> bool {
        self.pending_load.is_some()
            || self
                .anim
                .as_ref()
                .is_some_and(|plan| !plan.is_done(Instant::now()))
    }

    /// Visible node paths ordered top to bottom.
    fn vertical_order(&self) -> Vec<NodePath> {
        let mut order: Vec<(f64, NodePath)> = self
            .last_placed
            .iter()
            .map(|p| (p.x, p.path.clone()))
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0));
        order.into_iter().map(|(_, path)| path).collect()
    }

    fn move_focus(&mut self, direction: Direction) {
        if self.last_placed.is_empty() {
            return;
        }
        match direction {
            Direction::Up | Direction::Down => {
                let order = self.vertical_order();
                let idx = order.iter().position(|p| *p == self.focused).unwrap_or(0);
                let next = match direction {
                    Direction::Up => idx.saturating_sub(1),
                    _ => (idx + 1).min(order.len() - 1),
                };
                self.focused = order[next].clone();
            }
            Direction::Left => {
                if !self.focused.is_empty() {
                    self.focused.pop();
                }
            }
            Direction::Right => {
                let has_child = self
                    .root
                    .as_ref()
                    .and_then(|r| r.node_at(&self.focused))
                    .is_some_and(|n| !n.visible_children().is_empty());
                if has_child {
                    self.focused.push(0);
                }
            }
        }
    }

    fn cycle_focus(&mut self) {
        if self.last_placed.is_empty() {
            return;
        }
        let idx = self
            .last_placed
            .iter()
            .position(|p| p.path == self.focused)
            .unwrap_or(0);
        let next = (idx + 1) % self.last_placed.len();
        self.focused = self.last_placed[next].path.clone();
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if self.show_settings {
            let event = settings::handle_key(key, &mut self.settings_state, &mut self.config);
            match event {
                SettingsEvent::Changed => self.persist_config()?,
                SettingsEvent::Close => self.show_settings = false,
                SettingsEvent::None => {}
            }
            return Ok(false);
        }

        self.status_message = None;
        match input::action_for_key(key) {
            Action::Quit => return Ok(true),
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::OpenSettings => self.show_settings = true,
            Action::Activate => {
                let path = self.focused.clone();
                self.toggle_at(&path);
            }
            Action::Move(direction) => self.move_focus(direction),
            Action::NextNode => self.cycle_focus(),
            Action::NextPly => self.change_ply(true),
            Action::PrevPly => self.change_ply(false),
            Action::ExpandAll => self.expand_all(),
            Action::Cancel => self.show_help = false,
            Action::Noop => {}
        }
        Ok(false)
    }

    fn handle_click(&mut self, column: u16, row: u16) {
        let hit = self
            .hit_boxes
            .iter()
            .find(|h| h.contains(column, row))
            .map(|h| h.path.clone());
        if let Some(path) = hit {
            self.toggle_at(&path);
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let now = Instant::now();
        let (nodes, edges) = match &self.anim {
            Some(plan) => plan.sample(plan.progress_at(now)),
            None => (Vec::new(), Vec::new()),
        };
        let data = RenderData {
            nodes: &nodes,
            edges: &edges,
            board: self.history.current(),
            depth: self.history.len() - 1,
            ply: self.current_ply,
            max_ply: self.config.max_ply,
            focused: Some(self.focused.as_slice()),
            show_labels: self.config.show_labels,
            show_board: self.config.show_board,
            status: self.status_message.as_deref(),
            loading: self.pending_load.is_some(),
            show_help: self.show_help,
        };
        self.hit_boxes = render::draw(frame, &data);

        if self.show_settings {
            settings::draw(frame, &self.settings_state, &self.config);
        }
    }

    fn persist_config(&self) -> Result<()> {
        if self.demo {
            return Ok(());
        }
        if let Some(path) = &self.config_path {
            config::save(path, &self.config)?;
        }
        Ok(())
    }
}

pub fn run(demo: bool, data_dir: Option<PathBuf>, ply: Option<u32>) -> Result<()> {
    let mut app = ViewerState::load(demo, data_dir, ply)?;

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    loop {
        app.drain_pending();
        terminal.draw(|f| app.draw(f))?;

        let tick = if app.is_busy() { FAST_TICK } else { IDLE_TICK };
        if !event::poll(tick)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => {
                if matches!(key.kind, KeyEventKind::Release | KeyEventKind::Repeat) {
                    continue;
                }
                if app.handle_key(key)? {
                    break;
                }
            }
            Event::Mouse(mouse) => {
                if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
                    app.handle_click(mouse.column, mouse.row);
                }
            }
            _ => {}
        }
    }
    Ok(())
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, DisableMouseCapture);
    }
}

/// Built-in sample tree for `--demo`: one recorded ply with a handful of
/// continuations and replies, shaped like the engine's real documents.
fn demo_tree(ply: u32) -> TreeNode {
    let moves = ["d3", "c4", "e5", "b2"];
    let replies = ["d5", "e3", "c2"];
    let base = (ply as usize) % 3;

    let mut root = TreeNode::new(
        format!("Root: Ply {}", store::file_index(ply)),
        demo_board(&[(base, base)]),
        11.0,
        20.0,
    );
    root.ply = Some(store::file_index(ply));

    let mut children = Vec::new();
    for (i, mv) in moves.iter().enumerate() {
        let mut child = TreeNode::new(
            *mv,
            demo_board(&[(base, base), (i + 1, 2)]),
            (3 + (i + base) % 4) as f64,
            8.0,
        );
        child.ply = Some(store::file_index(ply) + 1);
        let grand = replies
            .iter()
            .enumerate()
            .map(|(j, reply)| {
                let mut node = TreeNode::new(
                    *reply,
                    demo_board(&[(base, base), (i + 1, 2), (j, 4)]),
                    (2 + (i + j) % 3) as f64,
                    4.0,
                );
                node.ply = Some(store::file_index(ply) + 2);
                node
            })
            .collect();
        child.children = Children::Visible(grand);
        children.push(child);
    }
    root.children = Children::Visible(children);
    loader::prepare(&mut root);
    root
}

fn demo_board(stones: &[(usize, usize)]) -> String {
    let mut grid = [['.'; 6]; 6];
    for (i, &(row, col)) in stones.iter().enumerate() {
        grid[row % 6][col % 6] = if i % 2 == 0 { 'x' } else { 'o' };
    }
    grid.iter()
        .map(|row| row.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PLY0_DOC: &str = r#"{
        "name": "Root: Ply 0", "str": "start", "total": 5.0, "visits": 10,
        "children": [
            {"name": "a", "str": "board a", "total": 8.0, "visits": 10,
             "children": [
                {"name": "a1", "str": "board a1", "total": 1.0, "visits": 2, "children": []}
             ]},
            {"name": "b", "str": "board b", "total": 2.0, "visits": 10, "children": []}
        ]
    }"#;

    const PLY1_DOC: &str = r#"{
        "name": "Root: Ply 2", "str": "after two plies", "total": 4.0, "visits": 9,
        "children": [
            {"name": "c", "str": "board c", "total": 3.0, "visits": 6, "children": []}
        ]
    }"#;

    fn demo_state() -> ViewerState {
        ViewerState::load(true, None, None).unwrap()
    }

    fn disk_state(dir: &TempDir) -> ViewerState {
        ViewerState::load(false, Some(dir.path().to_path_buf()), Some(0)).unwrap()
    }

    fn write_doc(dir: &TempDir, ply: u32, text: &str) {
        fs::write(store::tree_path(dir.path(), ply), text).unwrap();
    }

    fn drain_blocking(app: &mut ViewerState) {
        for _ in 0..200 {
            app.drain_pending();
            if app.pending_load.is_none() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("background load never completed");
    }

    #[test]
    fn demo_loads_with_single_entry_history() {
        let app = demo_state();
        assert_eq!(app.history.len(), 1);
        let root = app.root.as_ref().unwrap();
        assert!(!root.is_collapsed());
        assert!(root.all_children().iter().all(|c| c.is_collapsed()));
    }

    #[test]
    fn expand_then_collapse_round_trips_tree_and_history() {
        let mut app = demo_state();
        let before_tree = app.root.clone();
        let before_history = app.history.clone();

        app.toggle_at(&[0]);
        assert_eq!(app.history.len(), 2);
        let child = app.root.as_ref().unwrap().node_at(&[0]).unwrap();
        assert_eq!(app.history.current(), child.board);
        assert!(!child.is_collapsed());

        app.toggle_at(&[0]);
        assert_eq!(app.root, before_tree);
        assert_eq!(app.history, before_history);
    }

    #[test]
    fn collapsing_the_root_leaves_history_alone() {
        let mut app = demo_state();
        app.toggle_at(&[]);
        assert_eq!(app.history.len(), 1);
        assert!(app.root.as_ref().unwrap().is_collapsed());
        assert_eq!(app.last_placed.len(), 1, "only the root stays visible");
    }

    #[test]
    fn toggling_a_leaf_changes_nothing() {
        let mut app = demo_state();
        app.toggle_at(&[0]);
        let before_history = app.history.clone();
        let before_tree = app.root.clone();
        app.toggle_at(&[0, 0]);
        assert_eq!(app.history, before_history);
        assert_eq!(app.root, before_tree);
    }

    #[test]
    fn history_tracks_expand_and_collapse_counts() {
        let mut app = demo_state();
        app.toggle_at(&[0]);
        app.toggle_at(&[1]);
        assert_eq!(app.history.len(), 3);
        app.toggle_at(&[1]);
        assert_eq!(app.history.len(), 2);
        app.toggle_at(&[0]);
        assert_eq!(app.history.len(), 1);
    }

    #[test]
    fn previous_ply_at_zero_is_clamped() {
        let mut app = demo_state();
        app.change_ply(false);
        assert_eq!(app.current_ply, 0);
        assert!(app.pending_load.is_none());
    }

    #[test]
    fn next_ply_at_the_bound_is_clamped() {
        let mut app = demo_state();
        app.current_ply = app.config.max_ply;
        app.change_ply(true);
        assert_eq!(app.current_ply, app.config.max_ply);
    }

    #[test]
    fn demo_ply_change_resets_history_and_tree() {
        let mut app = demo_state();
        app.toggle_at(&[0]);
        assert_eq!(app.history.len(), 2);
        app.change_ply(true);
        assert_eq!(app.current_ply, 1);
        assert_eq!(app.history.len(), 1);
        let root = app.root.as_ref().unwrap();
        assert!(root.all_children().iter().all(|c| c.is_collapsed()));
    }

    #[test]
    fn background_load_replaces_tree_on_success() {
        let dir = TempDir::new().unwrap();
        write_doc(&dir, 0, PLY0_DOC);
        write_doc(&dir, 1, PLY1_DOC);
        let mut app = disk_state(&dir);

        app.change_ply(true);
        assert!(app.pending_load.is_some());
        drain_blocking(&mut app);

        assert_eq!(app.current_ply, 1);
        assert_eq!(app.root.as_ref().unwrap().name, "Root: Ply 2");
        assert_eq!(app.history.len(), 1);
        assert_eq!(app.history.current(), "after two plies");
    }

    #[test]
    fn failed_load_rolls_back_and_keeps_the_old_tree() {
        let dir = TempDir::new().unwrap();
        write_doc(&dir, 0, PLY0_DOC);
        let mut app = disk_state(&dir);

        app.change_ply(true);
        drain_blocking(&mut app);

        assert_eq!(app.current_ply, 0, "failed load must roll the ply back");
        assert_eq!(app.root.as_ref().unwrap().name, "Root: Ply 0");
        assert!(app.status_message.is_some());
    }

    #[test]
    fn stale_load_results_are_discarded() {
        let dir = TempDir::new().unwrap();
        write_doc(&dir, 0, PLY0_DOC);
        write_doc(&dir, 1, PLY1_DOC);
        let mut app = disk_state(&dir);

        app.change_ply(true);
        // A newer request superseded this one before it landed.
        app.current_ply = 2;
        drain_blocking(&mut app);

        assert_eq!(app.root.as_ref().unwrap().name, "Root: Ply 0");
        assert_eq!(app.current_ply, 2);
    }

    #[test]
    fn expand_all_reveals_every_node_without_touching_history() {
        let mut app = demo_state();
        app.expand_all();
        assert_eq!(app.history.len(), 1);
        let total = app.root.as_ref().unwrap().count();
        assert_eq!(app.last_placed.len(), total);
    }

    #[test]
    fn focus_moves_through_visible_nodes() {
        let mut app = demo_state();
        assert_eq!(app.focused, Vec::<usize>::new());
        app.move_focus(Direction::Down);
        assert_ne!(app.focused, Vec::<usize>::new());
        app.move_focus(Direction::Left);
        assert_eq!(app.focused, Vec::<usize>::new());
        app.cycle_focus();
        assert_eq!(app.focused, vec![0]);
    }

    #[test]
    fn focus_falls_back_to_source_after_collapse() {
        let mut app = demo_state();
        app.toggle_at(&[0]);
        app.focused = vec![0, 1];
        app.toggle_at(&[0]);
        assert_eq!(app.focused, vec![0]);
    }

    #[test]
    fn demo_tree_matches_document_shape() {
        let root = demo_tree(3);
        assert_eq!(root.name, "Root: Ply 6");
        assert!(root.all_children().iter().all(|c| c.is_collapsed()));
        let scores: Vec<f64> = root.all_children().iter().map(|c| c.score()).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]), "sorted: {scores:?}");
    }
}
