//! Sequential UI checklist run against a single browser page

use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::driver::{PageDriver, Viewport};
use crate::error::E2eResult;
use crate::playwright::PlaywrightConfig;
use crate::results::{CheckName, CheckResults};

const NAV_LINKS: &str = "nav a";
const THEME_ELEMENTS: &str = "[class*='green'], [class*='primary']";
const RECIPE_LINK: &str = "a[href='/recipesuggester']";
const TEXT_INPUTS: &str = "input[type='text']";
const DETECT_BUTTON: &str = "button:has-text('Detect')";
const NUMBER_INPUTS: &str = "input[type='number']";
const HAMBURGER_MENU: &str = "[class*='hamburger'], [class*='menu-icon']";
const MEDIA_SECTION: &str = "[id*='media'], [class*='media']";

/// Ingredient inputs the recipe suggester must offer
const MIN_INGREDIENT_FIELDS: usize = 5;

/// Protein, carbs and fat
const MIN_MACRO_FIELDS: usize = 3;

pub const MACRO_PLANNER_PATH: &str = "/mealbymacros";

/// Configuration for the UI checker
#[derive(Debug, Clone)]
pub struct UiConfig {
    pub base_url: String,
    pub screenshot_dir: PathBuf,
    pub playwright: PlaywrightConfig,

    /// How long to wait for the server before launching (zero = don't wait)
    pub wait: Duration,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            screenshot_dir: PathBuf::from("."),
            playwright: PlaywrightConfig::default(),
            wait: Duration::ZERO,
        }
    }
}

/// Everything a checklist run collected, including partial results
#[derive(Debug, Clone)]
pub struct UiRun {
    pub results: CheckResults,
    pub page_title: Option<String>,
    pub screenshots: Vec<PathBuf>,
    pub error: Option<String>,
}

impl UiRun {
    pub fn success(&self) -> bool {
        self.results.all_passed()
    }
}

pub struct UiChecker<D: PageDriver> {
    driver: D,
    base_url: String,
    screenshot_dir: PathBuf,
    results: CheckResults,
    page_title: Option<String>,
    screenshots: Vec<PathBuf>,
}

impl<D: PageDriver> UiChecker<D> {
    pub fn new(driver: D, base_url: impl Into<String>, screenshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            driver,
            base_url: base_url.into(),
            screenshot_dir: screenshot_dir.into(),
            results: CheckResults::new(),
            page_title: None,
            screenshots: Vec::new(),
        }
    }

    /// Run every check in order. The first error ends the sequence; results
    /// gathered before it are kept. The driver is closed either way.
    pub async fn run(mut self) -> UiRun {
        let error = match self.run_sequence().await {
            Ok(()) => None,
            Err(e) => {
                error!("Error during testing: {}", e);
                Some(e.to_string())
            }
        };

        if let Err(e) = self.driver.close().await {
            warn!("Failed to close browser: {}", e);
        }

        UiRun {
            results: self.results,
            page_title: self.page_title,
            screenshots: self.screenshots,
            error,
        }
    }

    async fn run_sequence(&mut self) -> E2eResult<()> {
        self.driver.set_viewport(Viewport::DESKTOP).await?;

        self.check_main_page().await?;
        self.check_recipe_suggester().await?;
        self.check_macro_planner().await?;
        self.check_responsive_design().await?;
        self.check_media_section().await?;

        Ok(())
    }

    fn root_url(&self) -> &str {
        &self.base_url
    }

    fn page_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn screenshot(&mut self, file_name: &str) -> E2eResult<()> {
        let path = self.screenshot_dir.join(file_name);
        self.driver.screenshot(&path).await?;
        self.screenshots.push(path);
        Ok(())
    }

    async fn check_main_page(&mut self) -> E2eResult<()> {
        info!("Testing Main Page...");
        let root = self.root_url().to_string();
        self.driver.goto(&root).await?;

        let title = self.driver.title().await?;
        info!("Page title: {}", title);
        self.page_title = Some(title);

        self.screenshot("main_page.png").await?;

        let nav_links = self.driver.count(NAV_LINKS).await?;
        if nav_links > 0 {
            let details = format!("Found {} navigation links", nav_links);
            info!("{}", details);
            self.results.pass(CheckName::Navigation, details);
        } else {
            info!("Navigation menu not found");
            self.results.fail(CheckName::Navigation, "Navigation menu not found");
        }

        let themed = self.driver.count(THEME_ELEMENTS).await?;
        if themed > 0 {
            let details = format!("Found {} green-themed elements", themed);
            info!("{}", details);
            self.results.pass(CheckName::VisualDesign, details);
        } else {
            info!("Green theme not detected");
            self.results.fail(CheckName::VisualDesign, "Green theme not detected");
        }

        Ok(())
    }

    async fn check_recipe_suggester(&mut self) -> E2eResult<()> {
        info!("Testing Recipe Suggester Page...");

        if !self.driver.click_first(RECIPE_LINK).await? {
            info!("Recipe Suggester link not found");
            self.results
                .fail(CheckName::RecipeSuggester, "Recipe Suggester link not found");
            return Ok(());
        }

        self.driver.wait_for_network_idle().await?;
        self.screenshot("recipe_suggester.png").await?;

        let fields = self.driver.count(TEXT_INPUTS).await?;
        if fields >= MIN_INGREDIENT_FIELDS {
            let details = format!("Found {} ingredient input fields", fields);
            info!("{}", details);
            self.results.pass(CheckName::RecipeSuggester, details);
        } else {
            let details = format!(
                "Expected at least {} ingredient fields, found {}",
                MIN_INGREDIENT_FIELDS, fields
            );
            info!("{}", details);
            self.results.fail(CheckName::RecipeSuggester, details);
        }

        // Informational only; does not change the verdict
        if self.driver.exists(DETECT_BUTTON).await? {
            info!("Photo detection feature found");
        } else {
            info!("Photo detection feature not found");
            self.results.append_details(
                CheckName::RecipeSuggester,
                ". Photo detection feature not found",
            );
        }

        Ok(())
    }

    async fn check_macro_planner(&mut self) -> E2eResult<()> {
        info!("Testing Macro Planner Page...");
        let url = self.page_url(MACRO_PLANNER_PATH);
        self.driver.goto(&url).await?;
        self.driver.wait_for_network_idle().await?;
        self.screenshot("macro_planner.png").await?;

        let fields = self.driver.count(NUMBER_INPUTS).await?;
        if fields >= MIN_MACRO_FIELDS {
            let details = format!("Found {} macro input fields", fields);
            info!("{}", details);
            self.results.pass(CheckName::MacroPlanner, details);
        } else {
            let details = format!(
                "Expected at least {} macro fields, found {}",
                MIN_MACRO_FIELDS, fields
            );
            info!("{}", details);
            self.results.fail(CheckName::MacroPlanner, details);
        }

        Ok(())
    }

    async fn load_root_at(&mut self, viewport: Viewport, file_name: &str) -> E2eResult<()> {
        self.driver.set_viewport(viewport).await?;
        let root = self.root_url().to_string();
        self.driver.goto(&root).await?;
        self.driver.wait_for_network_idle().await?;
        self.screenshot(file_name).await
    }

    async fn check_responsive_design(&mut self) -> E2eResult<()> {
        info!("Testing Responsive Design...");
        self.load_root_at(Viewport::TABLET, "tablet_view.png").await?;
        self.load_root_at(Viewport::MOBILE, "mobile_view.png").await?;

        if self.driver.exists(HAMBURGER_MENU).await? {
            let details = "Responsive design detected (hamburger menu found)";
            info!("{}", details);
            self.results.pass(CheckName::ResponsiveDesign, details);
        } else {
            let details = "Hamburger menu not found, responsive design might be missing";
            info!("{}", details);
            self.results.fail(CheckName::ResponsiveDesign, details);
        }

        Ok(())
    }

    async fn check_media_section(&mut self) -> E2eResult<()> {
        info!("Testing Media Section...");
        let root = self.root_url().to_string();
        self.driver.goto(&root).await?;
        self.driver.wait_for_network_idle().await?;

        if self.driver.exists(MEDIA_SECTION).await? {
            info!("Media section found");
            self.results.pass(CheckName::MediaSection, "Media section found");
        } else {
            info!("Media section not found");
            self.results.fail(CheckName::MediaSection, "Media section not found");
        }

        Ok(())
    }
}
