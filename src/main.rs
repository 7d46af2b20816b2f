use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use cms_edit::modules::api::{ContentApi, HttpContentApi};
use cms_edit::modules::editor::InlineEditor;
use cms_edit::modules::error::EditError;
use cms_edit::modules::forms::{FormState, ListKind};
use cms_edit::modules::logging::init_logger;
use cms_edit::modules::page::scan_page;
use cms_edit::modules::serialize::load_config;
use cms_edit::modules::types::EditableElement;

#[derive(Parser)]
#[command(
    name = "cms-edit",
    version,
    about = "Edit the editable regions of a CMS page in place"
)]
struct Cli {
    #[arg(short = 'l', long = "log-file", default_value = "cms-edit.log")]
    log_file: String,

    #[arg(long = "log-level", default_value = "info")]
    log_level: String,

    #[arg(short = 'c', long = "config", default_value = "./cms-edit.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Page {
    /// Local HTML file, or a path on the configured site
    #[arg(short = 'p', long = "page", default_value = "/")]
    page: String,
}

#[derive(Args)]
struct Target {
    #[command(flatten)]
    page: Page,

    /// Index of the element as listed by `scan`
    #[arg(short = 't', long = "target")]
    target: usize,
}

#[derive(Subcommand)]
enum Command {
    /// List the editable regions of a page
    Scan(Page),
    /// Replace the text of a text element
    Text {
        #[command(flatten)]
        target: Target,
        value: String,
    },
    /// Upload a new image for an image element
    Image {
        #[command(flatten)]
        target: Target,
        file: PathBuf,
    },
    /// Point a video element at a new address
    Video {
        #[command(flatten)]
        target: Target,
        url: String,
    },
    /// Change the address and text of a link
    Link {
        #[command(flatten)]
        target: Target,
        url: String,
        text: String,
    },
    /// Inspect or change the structured content of a JSON element
    Json {
        #[command(flatten)]
        target: Target,
        #[command(subcommand)]
        action: JsonAction,
    },
    /// Switch the site's edit mode on or off
    Toggle,
}

#[derive(Subcommand)]
enum JsonAction {
    /// Print the detected shape and the document
    Show,
    /// Replace the whole document with the contents of a file
    Replace { file: PathBuf },
    /// Append a blank entry to a list
    Add { list: ListArg },
    /// Remove the entry at an index
    Remove { list: ListArg, index: usize },
    /// Move an entry one place towards the start
    Up { list: ListArg, index: usize },
    /// Move an entry one place towards the end
    Down { list: ListArg, index: usize },
}

#[derive(Clone, Copy, ValueEnum)]
enum ListArg {
    Fields,
    ContactInfo,
    Items,
    Highlights,
    Navbar,
}

impl From<ListArg> for ListKind {
    fn from(list: ListArg) -> Self {
        match list {
            ListArg::Fields => ListKind::Fields,
            ListArg::ContactInfo => ListKind::ContactInfo,
            ListArg::Items => ListKind::Facts,
            ListArg::Highlights => ListKind::Highlights,
            ListArg::Navbar => ListKind::Navbar,
        }
    }
}

async fn load_page(api: &HttpContentApi, page: &str) -> Result<Vec<EditableElement>, EditError> {
    let html = if Path::new(page).is_file() {
        fs::read_to_string(page)?
    } else {
        api.fetch_page(page).await?
    };
    scan_page(&html)
}

async fn open_editor(api: HttpContentApi, page: &str) -> Result<InlineEditor<HttpContentApi>, EditError> {
    let elements = load_page(&api, page).await?;
    info!("Found {} editable elements on {page}", elements.len());
    Ok(InlineEditor::new(api, elements))
}

async fn edit_text<A: ContentApi>(
    editor: &mut InlineEditor<A>,
    index: usize,
    value: String,
) -> Result<(), EditError> {
    editor.open_text(index)?;
    editor.set_draft(index, value)?;
    editor.save_text(index).await
}

async fn edit_video<A: ContentApi>(
    editor: &mut InlineEditor<A>,
    index: usize,
    url: String,
) -> Result<(), EditError> {
    editor.open_video(index)?;
    editor.fill_video(url)?;
    editor.save_video().await
}

async fn edit_link<A: ContentApi>(
    editor: &mut InlineEditor<A>,
    index: usize,
    url: String,
    text: String,
) -> Result<(), EditError> {
    editor.open_link(index)?;
    editor.fill_link(url, text)?;
    editor.save_link().await
}

async fn run_json<A: ContentApi>(
    editor: &mut InlineEditor<A>,
    target: usize,
    action: JsonAction,
) -> Result<(), EditError> {
    editor.open_json(target).await?;
    let form = editor.json_form_mut()?;
    let changed = match action {
        JsonAction::Show => {
            println!("shape: {}", form.tag());
            println!("{:#}", form.extract()?);
            editor.cancel_modal()?;
            return Ok(());
        }
        JsonAction::Replace { file } => {
            *form = FormState::from_raw(&fs::read_to_string(file)?)?;
            true
        }
        JsonAction::Add { list } => {
            let index = form.add_item(list.into())?;
            println!("added entry #{index}");
            true
        }
        JsonAction::Remove { list, index } => form.remove_item(list.into(), index)?,
        JsonAction::Up { list, index } => form.move_up(list.into(), index)?,
        JsonAction::Down { list, index } => form.move_down(list.into(), index)?,
    };
    if !changed {
        println!("Nothing to change.");
        editor.cancel_modal()?;
        return Ok(());
    }
    editor.save_json().await
}

fn report<A: ContentApi>(editor: &mut InlineEditor<A>, target: Option<usize>) {
    for notification in editor.ui_mut().visible(Instant::now()) {
        println!("{notification}");
    }
    if let Some(message) = editor.ui().validation() {
        println!("{message}");
    }
    if let Some(element) = target.and_then(|i| editor.elements().get(i)) {
        println!("{element}");
    }
    if editor.ui().reload_requested() {
        println!("Reload the page to see the change.");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logger(&cli.log_file, &cli.log_level)?;

    let config = load_config(&cli.config)?;
    let api = HttpContentApi::new(&config)?;

    let (mut editor, target, result) = match cli.command {
        Command::Scan(page) => {
            let editor = open_editor(api, &page.page).await?;
            for (index, element) in editor.elements().iter().enumerate() {
                println!("#{index} {element}");
            }
            return Ok(());
        }
        Command::Toggle => {
            let mut editor = InlineEditor::new(api, Vec::new());
            let result = editor.toggle_edit_mode().await.map(|on| {
                println!("Edit mode {}", if on { "on" } else { "off" });
            });
            (editor, None, result)
        }
        Command::Text { target, value } => {
            let mut editor = open_editor(api, &target.page.page).await?;
            let index = target.target;
            let result = edit_text(&mut editor, index, value).await;
            (editor, Some(index), result)
        }
        Command::Image { target, file } => {
            let mut editor = open_editor(api, &target.page.page).await?;
            let index = target.target;
            let bytes = fs::read(&file)?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            let result = editor.replace_image(index, &file_name, bytes).await;
            (editor, Some(index), result)
        }
        Command::Video { target, url } => {
            let mut editor = open_editor(api, &target.page.page).await?;
            let index = target.target;
            let result = edit_video(&mut editor, index, url).await;
            (editor, Some(index), result)
        }
        Command::Link { target, url, text } => {
            let mut editor = open_editor(api, &target.page.page).await?;
            let index = target.target;
            let result = edit_link(&mut editor, index, url, text).await;
            (editor, Some(index), result)
        }
        Command::Json { target, action } => {
            let mut editor = open_editor(api, &target.page.page).await?;
            let index = target.target;
            let result = run_json(&mut editor, index, action).await;
            (editor, Some(index), result)
        }
    };

    report(&mut editor, target);
    result?;
    Ok(())
}
