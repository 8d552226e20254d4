// Linkboard state managers
// Managers own or borrow the board state: the layout model, the trash and the drag session.

pub mod drag_controller;
pub mod layout_model;
pub mod trash_manager;
