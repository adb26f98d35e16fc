use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{info, warn};

use crate::error::{DeckError, Result};
use crate::model::{TestAssembly, TestCase};

/// Strip Windows UNC prefix (\\?\) from path - dotnet CLI doesn't handle it well
fn strip_unc_prefix(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    match s.strip_prefix(r"\\?\") {
        Some(rest) => PathBuf::from(rest),
        None => path.to_path_buf(),
    }
}

fn is_test_project_name(name: &str) -> bool {
    name.ends_with("Tests") || name.ends_with("Test")
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

/// Resolve `start` to the test projects it names.
///
/// * a `.csproj` file is used as is,
/// * a `.sln` file contributes its test projects,
/// * a directory is searched (non-recursively) for a `.sln`, then for
///   `.csproj` files, then for test-named subdirectories holding one.
pub fn find_test_projects(start: &Path) -> Result<Vec<PathBuf>> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    let start = strip_unc_prefix(&start);

    let projects = if start.is_file() {
        if has_extension(&start, "csproj") {
            vec![start.clone()]
        } else if has_extension(&start, "sln") {
            parse_solution(&start)?
        } else {
            Vec::new()
        }
    } else if start.is_dir() {
        search_directory(&start)?
    } else {
        Vec::new()
    };

    if projects.is_empty() {
        return Err(DeckError::NoTestProjects(start));
    }
    Ok(projects)
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| DeckError::FileRead {
            path: dir.to_path_buf(),
            source: e,
        })?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();
    Ok(entries)
}

fn search_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = read_dir_sorted(dir)?;

    if let Some(sln) = entries.iter().find(|p| p.is_file() && has_extension(p, "sln")) {
        return parse_solution(sln);
    }

    let projects: Vec<PathBuf> = entries
        .iter()
        .filter(|p| p.is_file() && has_extension(p, "csproj"))
        .cloned()
        .collect();
    if !projects.is_empty() {
        return Ok(projects);
    }

    let mut projects = Vec::new();
    for sub in entries.iter().filter(|p| p.is_dir()) {
        let is_test_dir = sub
            .file_name()
            .is_some_and(|n| is_test_project_name(&n.to_string_lossy()));
        if !is_test_dir {
            continue;
        }
        projects.extend(
            read_dir_sorted(sub)?
                .into_iter()
                .filter(|p| p.is_file() && has_extension(p, "csproj")),
        );
    }
    Ok(projects)
}

/// Parse a .sln file to extract test project paths.
/// Looks for projects ending in Tests or Test.
fn parse_solution(sln_path: &Path) -> Result<Vec<PathBuf>> {
    let content = std::fs::read_to_string(sln_path).map_err(|e| DeckError::FileRead {
        path: sln_path.to_path_buf(),
        source: e,
    })?;

    let sln_dir = sln_path.parent().unwrap_or(Path::new("."));
    let mut projects = Vec::new();

    // Format: Project("{GUID}") = "Name", "Path.csproj", "{GUID}"
    for line in content.lines() {
        if !line.starts_with("Project(") {
            continue;
        }
        let parts: Vec<&str> = line.split('"').collect();
        if parts.len() < 6 {
            continue;
        }
        let name = parts[3];
        let rel_path = parts[5];
        if !is_test_project_name(name) || !rel_path.ends_with(".csproj") {
            continue;
        }
        let normalized_path = if cfg!(windows) {
            rel_path.replace('/', "\\")
        } else {
            rel_path.replace('\\', "/")
        };
        let full_path = sln_dir.join(normalized_path);
        if full_path.exists() {
            projects.push(full_path);
        }
    }

    Ok(projects)
}

/// Extract test names from `dotnet test --list-tests` output.
pub fn parse_test_list(stdout: &str) -> Vec<String> {
    let mut tests = Vec::new();
    let mut in_test_list = false;

    for line in stdout.lines() {
        let trimmed = line.trim();
        if trimmed == "The following Tests are available:" {
            in_test_list = true;
            continue;
        }
        if in_test_list && !trimmed.is_empty() && !tests.iter().any(|t| t == trimmed) {
            tests.push(trimmed.to_string());
        }
    }

    tests
}

/// Run `dotnet test --list-tests --no-build` for one project.
pub async fn list_tests(dotnet: &str, project_path: &Path) -> Result<Vec<String>> {
    let project_dir = project_path.parent().unwrap_or(Path::new("."));
    let output = Command::new(dotnet)
        .args(["test", "--list-tests", "--no-build"])
        .arg(project_path)
        .current_dir(project_dir)
        .output()
        .await
        .map_err(|e| DeckError::DotnetExecution(format!("Failed to spawn: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = [stderr.trim(), stdout.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(|s| s.lines().take(3).collect::<Vec<_>>().join("\n"))
            .unwrap_or_else(|| format!("Exit code: {:?}", output.status.code()));
        return Err(DeckError::DotnetExecution(detail));
    }

    Ok(parse_test_list(&String::from_utf8_lossy(&output.stdout)))
}

/// Discover every test project under `path` and list its tests. A project
/// whose listing fails is kept with no tests.
pub async fn discover_assemblies(dotnet: &str, path: &Path) -> Result<Vec<TestAssembly>> {
    let mut assemblies = Vec::new();
    for project_path in find_test_projects(path)? {
        let mut assembly = TestAssembly::new(project_path);
        match list_tests(dotnet, &assembly.path).await {
            Ok(names) => {
                assembly.tests = names.iter().map(|n| TestCase::from_listed_name(n)).collect();
                info!(project = %assembly.name(), tests = assembly.test_count(), "discovered tests");
            }
            Err(e) => warn!(project = %assembly.name(), error = %e, "test discovery failed"),
        }
        assemblies.push(assembly);
    }
    Ok(assemblies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_test_project_name() {
        assert!(is_test_project_name("MyProject.Tests"));
        assert!(is_test_project_name("MyProjectTest"));
        assert!(!is_test_project_name("MyProject"));
        assert!(!is_test_project_name("tests.Core"));
        assert!(!is_test_project_name(""));
    }

    #[test]
    fn test_strip_unc_prefix() {
        assert_eq!(strip_unc_prefix(Path::new(r"\\?\C:\src")), PathBuf::from(r"C:\src"));
        assert_eq!(strip_unc_prefix(Path::new("/src")), PathBuf::from("/src"));
    }

    #[test]
    fn test_parse_test_list() {
        let stdout = "\
Build started...
Test run for /src/App.Tests/bin/Debug/net8.0/App.Tests.dll (.NETCoreApp,Version=v8.0)
The following Tests are available:
    NS.MathTests.Adds
    NS.MathTests.Divides(x: 1)

    NS.MathTests.Adds
";
        assert_eq!(
            parse_test_list(stdout),
            vec!["NS.MathTests.Adds", "NS.MathTests.Divides(x: 1)"]
        );
    }

    #[test]
    fn test_parse_test_list_without_header() {
        assert!(parse_test_list("No test is available in App.Tests.dll.").is_empty());
    }

    #[test]
    fn test_find_csproj_file_directly() {
        let temp_dir = TempDir::new().unwrap();
        let csproj = temp_dir.path().join("App.Tests.csproj");
        fs::write(&csproj, "<Project />").unwrap();

        let projects = find_test_projects(&csproj).unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].file_name(), csproj.file_name());
    }

    #[test]
    fn test_find_csproj_files_in_directory() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("B.Tests.csproj"), "").unwrap();
        fs::write(temp_dir.path().join("A.Tests.csproj"), "").unwrap();
        fs::write(temp_dir.path().join("readme.md"), "").unwrap();

        let projects = find_test_projects(temp_dir.path()).unwrap();
        let names: Vec<_> = projects
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["A.Tests.csproj", "B.Tests.csproj"]);
    }

    #[test]
    fn test_find_projects_in_test_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let tests_dir = temp_dir.path().join("App.Tests");
        let app_dir = temp_dir.path().join("App");
        fs::create_dir(&tests_dir).unwrap();
        fs::create_dir(&app_dir).unwrap();
        fs::write(tests_dir.join("App.Tests.csproj"), "").unwrap();
        fs::write(app_dir.join("App.csproj"), "").unwrap();

        let projects = find_test_projects(temp_dir.path()).unwrap();
        assert_eq!(projects.len(), 1);
        assert!(projects[0].ends_with("App.Tests/App.Tests.csproj"));
    }

    #[test]
    fn test_find_projects_through_solution() {
        let temp_dir = TempDir::new().unwrap();
        let tests_dir = temp_dir.path().join("App.Tests");
        fs::create_dir(&tests_dir).unwrap();
        fs::write(tests_dir.join("App.Tests.csproj"), "").unwrap();
        fs::write(
            temp_dir.path().join("App.sln"),
            "Project(\"{FAE04EC0}\") = \"App\", \"App\\App.csproj\", \"{1}\"\n\
             Project(\"{FAE04EC0}\") = \"App.Tests\", \"App.Tests\\App.Tests.csproj\", \"{2}\"\n\
             Project(\"{FAE04EC0}\") = \"Gone.Tests\", \"Gone.Tests\\Gone.Tests.csproj\", \"{3}\"\n",
        )
        .unwrap();

        let projects = find_test_projects(temp_dir.path()).unwrap();
        assert_eq!(projects.len(), 1);
        assert!(projects[0].ends_with("App.Tests.csproj"));
    }

    #[test]
    fn test_find_projects_none_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = find_test_projects(temp_dir.path());
        assert!(matches!(result, Err(DeckError::NoTestProjects(_))));
    }

    #[test]
    fn test_find_projects_other_file_type() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("notes.txt");
        fs::write(&file, "").unwrap();
        assert!(matches!(find_test_projects(&file), Err(DeckError::NoTestProjects(_))));
    }

    #[tokio::test]
    async fn test_discover_keeps_project_when_listing_fails() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("App.Tests.csproj"), "").unwrap();

        let assemblies = discover_assemblies("/nonexistent/testdeck-dotnet", temp_dir.path())
            .await
            .unwrap();
        assert_eq!(assemblies.len(), 1);
        assert_eq!(assemblies[0].name(), "App.Tests");
        assert_eq!(assemblies[0].test_count(), 0);
    }
}
