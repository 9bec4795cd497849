use std::sync::Arc;

use crate::canvas::slots::{SlotInsert, SlotTable};

/// Keys the canvas forwards. Everything else is dropped by the host layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Space,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Other,
}

pub trait KeyHandler: Send + Sync {
    fn key_pressed(&self, key: KeyInput);
}

/// Positions are whole turtle-space units.
pub trait MouseHandler: Send + Sync {
    fn mouse_clicked(&self, at: (i32, i32));
    fn mouse_moved(&self, at: (i32, i32));
}

/// Registries of key and mouse handlers plus focus and last-mouse state.
pub struct InputRouter {
    key_handlers: SlotTable<Arc<dyn KeyHandler>>,
    mouse_handlers: SlotTable<Arc<dyn MouseHandler>>,
    focused: bool,
    mouse: (i32, i32),
}

impl std::fmt::Debug for InputRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputRouter")
            .field("key_handlers", &self.key_handlers.len())
            .field("mouse_handlers", &self.mouse_handlers.len())
            .field("focused", &self.focused)
            .field("mouse", &self.mouse)
            .finish()
    }
}

impl InputRouter {
    pub fn new(max_key_handlers: usize, max_mouse_handlers: usize) -> Self {
        Self {
            key_handlers: SlotTable::new(max_key_handlers),
            mouse_handlers: SlotTable::new(max_mouse_handlers),
            focused: false,
            mouse: (0, 0),
        }
    }

    pub fn add_key_handler(&mut self, handler: Arc<dyn KeyHandler>) -> bool {
        match self.key_handlers.insert(handler) {
            SlotInsert::Inserted(_) => true,
            SlotInsert::AlreadyPresent(_) => false,
            SlotInsert::Full => {
                tracing::error!(max = self.key_handlers.capacity(), "no space for key handler");
                false
            }
        }
    }

    pub fn remove_key_handler(&mut self, handler: &Arc<dyn KeyHandler>) -> bool {
        if self.key_handlers.remove(handler).is_some() {
            return true;
        }
        tracing::error!("removing a key handler that was never added");
        false
    }

    pub fn add_mouse_handler(&mut self, handler: Arc<dyn MouseHandler>) -> bool {
        match self.mouse_handlers.insert(handler) {
            SlotInsert::Inserted(_) => true,
            SlotInsert::AlreadyPresent(_) => false,
            SlotInsert::Full => {
                tracing::error!(max = self.mouse_handlers.capacity(), "no space for mouse handler");
                false
            }
        }
    }

    pub fn remove_mouse_handler(&mut self, handler: &Arc<dyn MouseHandler>) -> bool {
        if self.mouse_handlers.remove(handler).is_some() {
            return true;
        }
        tracing::error!("removing a mouse handler that was never added");
        false
    }

    pub fn key_handler_count(&self) -> usize {
        self.key_handlers.len()
    }

    pub fn mouse_handler_count(&self) -> usize {
        self.mouse_handlers.len()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn focus_gained(&mut self) {
        self.focused = true;
    }

    pub fn focus_lost(&mut self) {
        self.focused = false;
    }

    /// Last recorded mouse position in turtle space.
    pub fn mouse_position(&self) -> (i32, i32) {
        self.mouse
    }

    pub fn key_pressed(&self, key: KeyInput) {
        for (_, handler) in self.key_handlers.iter() {
            handler.key_pressed(key);
        }
    }

    /// A primary release counts as a click and grabs focus; other buttons
    /// are ignored.
    pub fn mouse_released(&mut self, at: (i32, i32), button: MouseButton) {
        if button != MouseButton::Primary {
            return;
        }
        self.mouse = at;
        for (_, handler) in self.mouse_handlers.iter() {
            handler.mouse_clicked(at);
        }
        self.focused = true;
    }

    /// Moves are only forwarded while focused.
    pub fn mouse_moved(&mut self, at: (i32, i32)) {
        if !self.focused {
            return;
        }
        self.mouse = at;
        for (_, handler) in self.mouse_handlers.iter() {
            handler.mouse_moved(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl KeyHandler for Recorder {
        fn key_pressed(&self, key: KeyInput) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{key:?}", self.name));
        }
    }

    impl MouseHandler for Recorder {
        fn mouse_clicked(&self, at: (i32, i32)) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:click{at:?}", self.name));
        }

        fn mouse_moved(&self, at: (i32, i32)) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:move{at:?}", self.name));
        }
    }

    #[test]
    fn key_events_fan_out_in_slot_order_without_duplicates() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a: Arc<dyn KeyHandler> = Arc::new(Recorder {
            name: "a",
            log: log.clone(),
        });
        let b: Arc<dyn KeyHandler> = Arc::new(Recorder {
            name: "b",
            log: log.clone(),
        });
        let mut router = InputRouter::new(3, 3);
        assert!(router.add_key_handler(a.clone()));
        assert!(!router.add_key_handler(a.clone()));
        assert!(router.add_key_handler(b.clone()));

        router.key_pressed(KeyInput::Up);
        assert_eq!(*log.lock().unwrap(), vec!["a:Up", "b:Up"]);

        assert!(router.remove_key_handler(&a));
        assert!(!router.remove_key_handler(&a));
        router.key_pressed(KeyInput::Char('x'));
        assert_eq!(log.lock().unwrap().last().unwrap(), "b:Char('x')");
    }

    #[test]
    fn handler_table_is_bounded() {
        let mut router = InputRouter::new(1, 1);
        let first: Arc<dyn KeyHandler> = Arc::new(Recorder::default());
        let second: Arc<dyn KeyHandler> = Arc::new(Recorder::default());
        assert!(router.add_key_handler(first));
        assert!(!router.add_key_handler(second));
        assert_eq!(router.key_handler_count(), 1);
    }

    #[test]
    fn moves_need_focus_and_clicks_grab_it() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<dyn MouseHandler> = Arc::new(Recorder {
            name: "m",
            log: log.clone(),
        });
        let mut router = InputRouter::new(1, 1);
        router.add_mouse_handler(handler);

        router.mouse_moved((1, 1));
        assert!(log.lock().unwrap().is_empty());

        router.mouse_released((5, -5), MouseButton::Other);
        assert!(!router.is_focused());

        router.mouse_released((5, -5), MouseButton::Primary);
        assert!(router.is_focused());
        router.mouse_moved((6, -6));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["m:click(5, -5)", "m:move(6, -6)"]
        );
        assert_eq!(router.mouse_position(), (6, -6));
    }
}
