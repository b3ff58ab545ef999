mod modal_overlay;
pub use modal_overlay::{ConfirmDialog, ModalOverlay};

mod note_card;
pub use note_card::NoteCard;

mod filter_bar;
pub use filter_bar::FilterBar;

mod image_picker;
pub use image_picker::ImagePicker;
