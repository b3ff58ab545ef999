mod signup;
pub use signup::SignUp;

mod login;
pub use login::Login;

mod dashboard;
pub use dashboard::Dashboard;

mod note_form;
pub use note_form::{CreateNote, EditNote};
