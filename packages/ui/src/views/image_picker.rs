use dioxus::prelude::*;
use store::ImageFile;

/// File chooser limited to images. The picked file is read into memory.
#[component]
pub fn ImagePicker(on_pick: EventHandler<ImageFile>, #[props(default)] disabled: bool) -> Element {
    let handle_change = move |evt: FormEvent| {
        let mut files = evt.files();
        let Some(file) = files.pop() else {
            return;
        };
        spawn(async move {
            let name = file.name();
            let content_type = file.content_type();
            match file.read_bytes().await {
                Ok(bytes) => on_pick.call(ImageFile::picked(name, content_type, bytes.to_vec())),
                Err(error) => tracing::warn!(%name, %error, "could not read picked image"),
            }
        });
    };

    rsx! {
        input {
            class: "image-picker",
            r#type: "file",
            accept: "image/*",
            disabled,
            onchange: handle_change,
        }
    }
}
