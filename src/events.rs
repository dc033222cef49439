/// What the user asked for while a simulation is being displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    CameraEvent(CameraEvent),

    /// The terminal now has `cols` columns and `rows` rows
    Resize { cols: u16, rows: u16 },

    /// Exit the application
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraEvent {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    ResetView,
}
