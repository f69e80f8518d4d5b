//! Product management commands.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Args;

use emporium_admin::workspace::{
    DeleteOutcome, ImageUpload, ProductForm, SpecificationRow,
};
use emporium_admin::{AdminConfig, AdminWorkspace, Confirm};
use emporium_core::{CategoryHierarchy, ProductId, Subcategories, filter_products};

use super::{CommandError, client, print_products, signed_in_workspace};

/// Form fields settable from the command line.
///
/// On update, fields that are not passed keep their current values.
#[derive(Debug, Default, Args)]
pub struct ProductArgs {
    /// Product name
    #[arg(long)]
    pub name: Option<String>,

    /// Category (clears subcategory and sub-subcategory unless also given)
    #[arg(long)]
    pub category: Option<String>,

    /// Subcategory (clears sub-subcategory unless also given)
    #[arg(long)]
    pub subcategory: Option<String>,

    /// Sub-subcategory
    #[arg(long)]
    pub sub_subcategory: Option<String>,

    /// Price label, e.g. "$18" (blank means "Request Price")
    #[arg(long)]
    pub price: Option<String>,

    /// Local image file to embed
    #[arg(long, conflicts_with = "image_url")]
    pub image: Option<PathBuf>,

    /// Remote image URL
    #[arg(long)]
    pub image_url: Option<String>,

    /// Rating from 0 to 5
    #[arg(long)]
    pub rating: Option<String>,

    /// Short description
    #[arg(long)]
    pub description: Option<String>,

    /// Detailed description
    #[arg(long)]
    pub detailed_description: Option<String>,

    /// Comma-separated features, e.g. "Smooth, Low acid"
    #[arg(long)]
    pub features: Option<String>,

    /// Specification entry; repeatable. An empty value removes the key.
    #[arg(long = "spec", value_name = "KEY=VALUE", value_parser = parse_spec)]
    pub specs: Vec<(String, String)>,

    /// Mark as new
    #[arg(long, conflicts_with = "not_new")]
    pub new: bool,

    /// Clear the new mark
    #[arg(long)]
    pub not_new: bool,
}

impl ProductArgs {
    /// The requested new flag, if either switch was given.
    #[must_use]
    pub const fn is_new(&self) -> Option<bool> {
        if self.new {
            Some(true)
        } else if self.not_new {
            Some(false)
        } else {
            None
        }
    }

    /// Write the given fields into `form`.
    ///
    /// Category is applied before subcategory, so passing both keeps both.
    pub fn apply(&self, form: &mut ProductForm) {
        if let Some(name) = &self.name {
            form.name.clone_from(name);
        }
        if let Some(category) = &self.category {
            form.set_category(category.clone());
        }
        if let Some(subcategory) = &self.subcategory {
            form.set_subcategory(subcategory.clone());
        }
        if let Some(sub_subcategory) = &self.sub_subcategory {
            form.sub_subcategory.clone_from(sub_subcategory);
        }
        if let Some(price) = &self.price {
            form.price.clone_from(price);
        }
        if let Some(url) = &self.image_url {
            form.image.clone_from(url);
            form.image_file = None;
        }
        if let Some(rating) = &self.rating {
            form.rating.clone_from(rating);
        }
        if let Some(description) = &self.description {
            form.description.clone_from(description);
        }
        if let Some(detailed) = &self.detailed_description {
            form.detailed_description.clone_from(detailed);
        }
        if let Some(features) = &self.features {
            form.features.clone_from(features);
        }
        for (key, value) in &self.specs {
            match form.specifications.iter_mut().find(|row| &row.key == key) {
                Some(row) => row.value.clone_from(value),
                None => form
                    .specifications
                    .push(SpecificationRow::new(key.clone(), value.clone())),
            }
        }
        if let Some(is_new) = self.is_new() {
            form.is_new = is_new;
        }
    }
}

/// Parse a `KEY=VALUE` specification argument.
fn parse_spec(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("specification key cannot be empty".to_string());
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Asks on the terminal unless `--yes` was given.
struct PromptConfirm {
    assume_yes: bool,
}

impl Confirm for PromptConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("{prompt} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// List products, optionally filtered by `search`.
pub async fn list(config: &AdminConfig, search: Option<&str>) -> Result<(), CommandError> {
    let workspace = signed_in_workspace(config).await?;
    let state = workspace.snapshot().await;
    print_products(filter_products(&state.products, search.unwrap_or_default()));
    Ok(())
}

/// Print the category hierarchy. No sign-in needed.
pub async fn categories(config: &AdminConfig, json: bool) -> Result<(), CommandError> {
    let products = client(config)?.list_products().await?;
    let hierarchy = CategoryHierarchy::from_products(&products);

    if json {
        let rendered = serde_json::to_string_pretty(&hierarchy)
            .map_err(|e| CommandError::Failed(e.to_string()))?;
        println!("{rendered}");
        return Ok(());
    }

    if hierarchy.is_empty() {
        println!("No categories found.");
    }
    for category in hierarchy.categories() {
        println!("{category}");
        match hierarchy.get(category) {
            Some(Subcategories::Nested(entries)) => {
                for (subcategory, children) in entries {
                    println!("  {subcategory}");
                    for child in children {
                        println!("    {child}");
                    }
                }
            }
            Some(Subcategories::Flat(names)) => {
                for name in names {
                    println!("  {name}");
                }
            }
            None => {}
        }
    }
    Ok(())
}

/// Create a product from `fields`.
pub async fn create(config: &AdminConfig, fields: &ProductArgs) -> Result<(), CommandError> {
    let workspace = signed_in_workspace(config).await?;
    workspace.reset_form().await;
    fill_and_submit(&workspace, fields).await
}

/// Update product `id`, keeping fields that are not passed.
pub async fn update(
    config: &AdminConfig,
    id: &ProductId,
    fields: &ProductArgs,
) -> Result<(), CommandError> {
    let workspace = signed_in_workspace(config).await?;
    workspace.begin_edit_by_id(id).await?;
    fill_and_submit(&workspace, fields).await
}

async fn fill_and_submit(
    workspace: &AdminWorkspace,
    fields: &ProductArgs,
) -> Result<(), CommandError> {
    workspace.edit_form(|form| fields.apply(form)).await;

    if let Some(path) = &fields.image {
        let upload = ImageUpload::from_path(path).map_err(|source| CommandError::Image {
            path: path.clone(),
            source,
        })?;
        workspace.attach_image(upload).await?;
    }

    let outcome = workspace.submit().await?;
    let state = workspace.snapshot().await;
    println!(
        "{}",
        state.success_message().unwrap_or_else(|| outcome.message())
    );
    Ok(())
}

/// Delete product `id` after confirmation.
pub async fn delete(config: &AdminConfig, id: &ProductId, yes: bool) -> Result<(), CommandError> {
    let workspace = signed_in_workspace(config).await?;
    let confirm = PromptConfirm { assume_yes: yes };

    match workspace.delete_product(id, &confirm).await? {
        DeleteOutcome::Deleted => {
            let state = workspace.snapshot().await;
            println!(
                "{}",
                state
                    .success_message()
                    .unwrap_or(emporium_admin::workspace::DELETED_MESSAGE)
            );
        }
        DeleteOutcome::Cancelled => println!("Cancelled."),
    }
    Ok(())
}
