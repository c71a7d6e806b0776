use catalog_admin::config::{self, CatalogConfig};
use catalog_admin::naming::ACCEPTED_EXTENSIONS;
use catalog_admin::notify::{IndexReport, notifier_from_config};
use catalog_admin::output;
use catalog_admin::store::{Catalog, CatalogLayout};
use catalog_admin::types::{NewProduct, PhotoUpload, ProductUpdate, UploadedFile};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// `--version` text: the crate version on a release tag, otherwise
/// `dev@<commit>` so catalogs edited with a development build can be traced.
fn version_string() -> &'static str {
    match (env!("ON_RELEASE_TAG"), env!("GIT_HASH")) {
        ("true", _) => env!("CARGO_PKG_VERSION"),
        (_, "") => "dev@unknown",
        // Built once per process for clap's 'static version
        (_, commit) => Box::leak(format!("dev@{commit}").into_boxed_str()),
    }
}

#[derive(Parser)]
#[command(name = "catalog-admin")]
#[command(about = "Manage a filesystem-backed product catalog")]
#[command(long_about = "\
Manage a filesystem-backed product catalog

The directory tree is the database. Brands are directories (and logos),
products are directories named by their slug, photos carry their order and
the featured tag in their filenames.

Catalog structure:

  <project>/
  ├── catalog.toml                      # Optional config
  ├── scripts/                          # Index generators run after each change
  └── assets/
      ├── logos/
      │   └── Acme.png                  # Brand logo
      └── productos/
          └── Acme/                     # Brand
              └── BLUE_SHIRT/           # Product slug (derived from the name)
                  ├── info.json         # nombre, marca, precio, tallas, categoria, url
                  └── fotos/
                      ├── 01_front.jpg      # 2-digit prefix = display order
                      └── 02_back_solo.jpg  # _solo = featured photo

Run 'catalog-admin gen-config' to generate a documented catalog.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Project directory (holds catalog.toml, assets/ and scripts/)
    #[arg(long, default_value = ".", global = true)]
    project: PathBuf,

    /// Debug logging and full index script output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Product selector shared by per-product commands.
#[derive(clap::Args)]
struct ProductRef {
    /// Brand name
    brand: String,
    /// Product slug (directory name)
    slug: String,
}

#[derive(clap::Args)]
struct CreateArgs {
    #[arg(long)]
    brand: Option<String>,
    /// Display name; the slug is derived from it
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long)]
    price: Option<f64>,
    /// Comma-separated sizes, e.g. S,M,L
    #[arg(long, value_delimiter = ',')]
    sizes: Vec<String>,
    #[arg(long, default_value = "")]
    category: String,
    #[arg(long, default_value = "")]
    url: String,
    /// Photo file; repeat in display order
    #[arg(long = "photo")]
    photos: Vec<PathBuf>,
    /// 1-based position of the featured photo
    #[arg(long)]
    featured: Option<usize>,
}

#[derive(clap::Args)]
struct UpdateArgs {
    #[command(flatten)]
    product: ProductRef,
    /// Options left out keep their current value
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    price: Option<f64>,
    #[arg(long, value_delimiter = ',')]
    sizes: Option<Vec<String>>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    url: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// List brands
    Brands,
    /// Add a brand by storing its logo (PNG/JPG/JPEG/WEBP)
    AddBrand {
        brand: String,
        logo: PathBuf,
    },
    /// List the products of a brand
    Products {
        brand: String,
    },
    /// Show a product with its photos
    Show(ProductRef),
    /// Create a product
    Create(CreateArgs),
    /// Edit a product's metadata (renames it when the slug changes)
    Update(UpdateArgs),
    /// Delete a product and all its photos
    Delete(ProductRef),
    /// Append photos to a product
    AddPhotos {
        #[command(flatten)]
        product: ProductRef,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Delete one photo of a product
    DeletePhoto {
        #[command(flatten)]
        product: ProductRef,
        /// Photo filename, e.g. 02_back.jpg
        photo: String,
    },
    /// Set the featured photo; omit the photo to clear it
    Feature {
        #[command(flatten)]
        product: ProductRef,
        photo: Option<String>,
    },
    /// Regenerate the catalog indexes
    Reindex,
    /// List the known sizes
    Sizes,
    /// Print a stock catalog.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let Cli {
        project,
        verbose,
        command,
    } = cli;

    // gen-config must work even when the existing catalog.toml is broken
    if let Command::GenConfig = command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&project)?;
    let layout = CatalogLayout::new(project.join(&config.assets_dir));
    let catalog = Catalog::new(layout, notifier_from_config(&project, &config.index));

    match command {
        Command::Brands => {
            let logos = catalog.layout().logos_dir();
            let has_logo = |brand: &str| {
                ACCEPTED_EXTENSIONS
                    .iter()
                    .any(|ext| logos.join(format!("{brand}.{ext}")).is_file())
            };
            output::print_brands(&catalog.list_brands(), has_logo);
        }
        Command::AddBrand { brand, logo } => {
            let upload = read_upload(&logo)?;
            let saved = catalog.save_logo(&brand, &upload.content, &upload.name)?;
            println!("Saved logo {}", saved.value.display());
            print_report(saved.index.as_ref(), verbose);
        }
        Command::Products { brand } => {
            output::print_products(&brand, &catalog.list_products(&brand));
        }
        Command::Show(product) => {
            output::print_product(&catalog.find_product(&product.brand, &product.slug)?);
        }
        Command::Create(args) => {
            let request = create_request(args)?;
            warn_unknown_sizes(&config, &request.sizes);
            let saved = catalog.create_product(request)?;
            println!("Created {}/{}", saved.value.brand, saved.value.slug);
            print_report(saved.index.as_ref(), verbose);
        }
        Command::Update(args) => {
            let current = catalog.find_product(&args.product.brand, &args.product.slug)?;
            let update = ProductUpdate {
                name: args.name.unwrap_or(current.info.name),
                price: args.price.or(current.info.price),
                sizes: args.sizes.unwrap_or(current.info.sizes),
                category: args.category.unwrap_or(current.info.category),
                url: args.url.unwrap_or(current.info.url),
            };
            warn_unknown_sizes(&config, &update.sizes);
            let saved = catalog.update_product(&args.product.brand, &current.dir, update)?;
            println!("Saved {}/{}", saved.value.brand, saved.value.slug);
            print_report(saved.index.as_ref(), verbose);
        }
        Command::Delete(product) => {
            let current = catalog.find_product(&product.brand, &product.slug)?;
            let saved = catalog.delete_product(&current.dir)?;
            println!("Deleted {}/{}", product.brand, product.slug);
            print_report(saved.index.as_ref(), verbose);
        }
        Command::AddPhotos { product, files } => {
            let current = catalog.find_product(&product.brand, &product.slug)?;
            let uploads = files
                .iter()
                .map(|f| read_upload(f))
                .collect::<Result<Vec<_>, _>>()?;
            let saved = catalog.add_photos(&current.dir, &uploads)?;
            output::print_photos(&saved.value);
            print_report(saved.index.as_ref(), verbose);
        }
        Command::DeletePhoto { product, photo } => {
            let current = catalog.find_product(&product.brand, &product.slug)?;
            let saved = catalog.delete_photo(&current.photos_dir().join(&photo))?;
            if saved.value {
                println!("Deleted {photo}");
            } else {
                println!("No photo {photo}, nothing deleted");
            }
            print_report(saved.index.as_ref(), verbose);
        }
        Command::Feature { product, photo } => {
            let current = catalog.find_product(&product.brand, &product.slug)?;
            let saved = catalog.set_featured_photo(&current.dir, photo.as_deref())?;
            output::print_photos(&saved.value);
            print_report(saved.index.as_ref(), verbose);
        }
        Command::Reindex => {
            let report = catalog.regenerate_index();
            output::print_index_report(&report, verbose);
        }
        Command::Sizes => output::print_sizes(&config.size_options),
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }

    Ok(())
}

fn create_request(args: CreateArgs) -> Result<NewProduct, std::io::Error> {
    let photos = args
        .photos
        .iter()
        .zip(1u32..)
        .map(|(path, position)| {
            Ok(PhotoUpload {
                file: read_upload(path)?,
                order: position,
                featured: args.featured == Some(position as usize),
            })
        })
        .collect::<Result<Vec<_>, std::io::Error>>()?;

    Ok(NewProduct {
        brand: args.brand,
        name: args.name,
        price: args.price,
        sizes: args.sizes,
        category: args.category,
        url: args.url,
        photos,
    })
}

fn read_upload(path: &Path) -> Result<UploadedFile, std::io::Error> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(UploadedFile::new(name, std::fs::read(path)?))
}

fn warn_unknown_sizes(config: &CatalogConfig, sizes: &[String]) {
    let unknown = config.unknown_sizes(sizes);
    if !unknown.is_empty() {
        eprintln!("Warning: sizes not in size_options: {}", unknown.join(", "));
    }
}

fn print_report(report: Option<&IndexReport>, verbose: bool) {
    if let Some(report) = report {
        output::print_index_report(report, verbose);
    }
}
