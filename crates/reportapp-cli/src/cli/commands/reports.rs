//! Report command handlers.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use reportapp_core::controllers::{Refresh, ReportFormController, ReportListController, Submission};
use reportapp_core::device::FixedPositioning;
use reportapp_core::geocode::GeocodeResolver;
use reportapp_core::models::Report;

use super::App;

/// Inputs of `reports create`.
#[derive(Debug, Default)]
pub struct CreateOptions {
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
    /// `(latitude, longitude)` to reverse-geocode into the address.
    pub coordinates: Option<(f64, f64)>,
}

pub async fn categories(app: &App) -> Result<()> {
    let categories = app
        .reports()
        .list_categories()
        .await
        .context("load categories")?;
    if categories.is_empty() {
        println!("No categories found.");
    } else {
        for category in categories {
            println!("{}  {}", category.id, category.name);
        }
    }
    Ok(())
}

pub async fn list(app: &App) -> Result<()> {
    let list = ReportListController::new(app.reports());
    let reports = match list.on_screen_focused().await.context("list reports")? {
        Refresh::Applied(reports) => reports,
        Refresh::Superseded => list.get().reports,
    };

    if reports.is_empty() {
        println!("No reports found.");
    } else {
        for report in &reports {
            println!("{}", format_report(report));
        }
    }
    Ok(())
}

pub async fn create(app: &App, options: CreateOptions) -> Result<()> {
    let mut form = ReportFormController::new_report(app.reports());
    if let Some((latitude, longitude)) = options.coordinates {
        let geocode = app
            .config()
            .geocode_config()
            .context("configure geocoding")?;
        form = form.with_location(
            Arc::new(FixedPositioning::new(latitude, longitude)),
            GeocodeResolver::new(geocode),
        );
    }
    form.on_screen_focused();

    if let Some(title) = options.title {
        form.set_title(title);
    }
    if let Some(category) = options.category {
        form.set_category(category);
    }
    if let Some(description) = options.description {
        form.set_description(description);
    }
    if options.coordinates.is_some() {
        let location = form
            .acquire_location()
            .await
            .context("resolve location")?;
        println!("Location: {}", location.address);
    }
    if let Some(location) = options.location {
        form.set_location(location);
    }
    if let Some(image) = options.image {
        form.attach_image(image);
    }

    if let Submission::Created(report) = form.submit().await.context("submit report")? {
        println!("Created report {}: {}", report.id, report.title);
    }
    Ok(())
}

pub async fn update(
    app: &App,
    id: i64,
    title: Option<String>,
    category: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let reports = app.reports();
    let mine = reports.list_mine().await.context("list reports")?;
    let Some(existing) = mine.iter().find(|report| report.id == id) else {
        bail!("Report {id} not found");
    };

    let form = ReportFormController::edit_report(reports, existing);
    if let Some(title) = title {
        form.set_title(title);
    }
    if let Some(category) = category {
        form.set_category(category);
    }
    if let Some(description) = description {
        form.set_description(description);
    }

    form.submit()
        .await
        .with_context(|| format!("update report {id}"))?;
    println!("Updated report {id}");
    Ok(())
}

pub async fn delete(app: &App, id: i64) -> Result<()> {
    ReportListController::new(app.reports())
        .delete(id)
        .await
        .with_context(|| format!("delete report {id}"))?;
    println!("Deleted report {id}");
    Ok(())
}

fn format_report(report: &Report) -> String {
    let category = report
        .report_type
        .as_ref()
        .map_or(report.category.as_str(), |t| t.name.as_str());
    let mut line = format!("{}  {}", report.id, report.title);
    if !category.is_empty() {
        line.push_str(&format!("  [{category}]"));
    }
    if !report.location.is_empty() {
        line.push_str("  ");
        line.push_str(&report.location);
    }
    line
}

#[cfg(test)]
mod tests {
    use reportapp_core::models::ReportType;

    use super::*;

    #[test]
    fn format_report_prefers_type_name() {
        let report = Report {
            id: 7,
            title: "Pothole".to_string(),
            category: "old".to_string(),
            description: String::new(),
            location: "Main St".to_string(),
            report_type: Some(ReportType {
                id: 3,
                name: "Roads".to_string(),
            }),
        };
        assert_eq!(format_report(&report), "7  Pothole  [Roads]  Main St");
    }

    #[test]
    fn format_report_skips_empty_parts() {
        let report = Report {
            id: 1,
            title: "Noise".to_string(),
            category: String::new(),
            description: String::new(),
            location: String::new(),
            report_type: None,
        };
        assert_eq!(format_report(&report), "1  Noise");
    }
}
