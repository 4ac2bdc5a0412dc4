use crate::model::CalendarFile;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use log::info;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CALENDAR_DIR: &str = ".prodcal";
const CALENDAR_FILE: &str = "calendar.yml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarScope {
    Project,
    Global,
}

impl CalendarScope {
    pub fn label(&self) -> &'static str {
        match self {
            CalendarScope::Project => "project",
            CalendarScope::Global => "global",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalendarLocation {
    pub path: PathBuf,
    pub scope: CalendarScope,
}

pub fn init_calendar(name: Option<String>) -> Result<CalendarLocation> {
    let cwd = env::current_dir()?;
    init_calendar_in(&cwd, name)
}

/// Creates `<dir>/.prodcal/calendar.yml` unless it already exists.
pub fn init_calendar_in(dir: &Path, name: Option<String>) -> Result<CalendarLocation> {
    let cal_dir = dir.join(CALENDAR_DIR);
    fs::create_dir_all(&cal_dir).context("failed to create .prodcal directory")?;
    let location = CalendarLocation {
        path: cal_dir.join(CALENDAR_FILE),
        scope: CalendarScope::Project,
    };
    if !location.path.exists() {
        let calendar_name = name.unwrap_or_else(|| {
            dir.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("productions")
                .to_string()
        });
        save_calendar(&location, &CalendarFile::default_named(calendar_name))?;
        info!("initialized calendar at {}", location.path.display());
    }
    Ok(location)
}

pub fn locate_calendar(start: &Path) -> Result<CalendarLocation> {
    if let Some(project_path) = find_project_calendar(start) {
        return Ok(CalendarLocation {
            path: project_path,
            scope: CalendarScope::Project,
        });
    }
    Ok(CalendarLocation {
        path: global_calendar_path()?,
        scope: CalendarScope::Global,
    })
}

pub fn load_calendar(location: &CalendarLocation) -> Result<CalendarFile> {
    if location.path.exists() {
        let data = fs::read_to_string(&location.path)
            .with_context(|| format!("reading {:?}", location.path))?;
        let calendar: CalendarFile =
            serde_yaml::from_str(&data).context("parsing calendar file")?;
        info!(
            "loaded {} projects from {}",
            calendar.projects.len(),
            location.path.display()
        );
        Ok(calendar)
    } else {
        let fallback_name = match location.scope {
            CalendarScope::Project => location
                .path
                .parent()
                .and_then(|p| p.parent())
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap_or("productions")
                .to_string(),
            CalendarScope::Global => "default".to_string(),
        };
        let calendar = CalendarFile::default_named(fallback_name);
        save_calendar(location, &calendar)?;
        Ok(calendar)
    }
}

pub fn save_calendar(location: &CalendarLocation, calendar: &CalendarFile) -> Result<()> {
    if let Some(parent) = location.path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(calendar).context("serializing calendar")?;
    fs::write(&location.path, serialized)
        .with_context(|| format!("writing {:?}", location.path))?;
    Ok(())
}

pub fn log_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("logs"))
}

fn find_project_calendar(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(CALENDAR_DIR).join(CALENDAR_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn global_calendar_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join(CALENDAR_FILE))
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "prodcal").context("locating data directory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Project;

    #[test]
    fn init_is_idempotent_and_discoverable_from_subdirectories() {
        let tmp = tempfile::tempdir().unwrap();
        let location = init_calendar_in(tmp.path(), Some("Season".into())).unwrap();
        assert_eq!(location.scope, CalendarScope::Project);

        let mut calendar = load_calendar(&location).unwrap();
        assert_eq!(calendar.name, "Season");
        calendar.add_project(Project::new("gala", "Gala")).unwrap();
        save_calendar(&location, &calendar).unwrap();

        // a second init must not clobber the file
        init_calendar_in(tmp.path(), Some("Other".into())).unwrap();

        let nested = tmp.path().join("venues").join("north");
        fs::create_dir_all(&nested).unwrap();
        let found = locate_calendar(&nested).unwrap();
        assert_eq!(found.path, location.path);
        let reloaded = load_calendar(&found).unwrap();
        assert_eq!(reloaded, calendar);
    }

    #[test]
    fn missing_project_file_is_created_with_directory_name() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("summer-fest");
        let location = CalendarLocation {
            path: dir.join(CALENDAR_DIR).join(CALENDAR_FILE),
            scope: CalendarScope::Project,
        };
        let calendar = load_calendar(&location).unwrap();
        assert_eq!(calendar.name, "summer-fest");
        assert!(location.path.exists());
    }
}
