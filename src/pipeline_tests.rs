#[cfg(test)]
mod tests {
    use crate::{Analyzer, Baseline, DiagnosticKind, ScanError};
    use std::fs;
    use std::path::Path;

    fn write_scripts(dir: &Path, files: &[(&str, &str)]) {
        for (name, source) in files {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, source).unwrap();
        }
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let result = Analyzer::new(vec!["/no/such/mod/tree".into()]).run();
        assert!(matches!(result, Err(ScanError::MissingDirectory(_))));
    }

    #[test]
    fn test_full_pipeline_over_a_small_mod() {
        let dir = tempfile::tempdir().unwrap();
        write_scripts(
            dir.path(),
            &[
                (
                    "server/items.cs",
                    concat!(
                        "datablock ItemData(Flag)\n{\n",
                        "   pickupRadius = 2;\n",
                        "   image = FlagImage;\n",
                        "};\n",
                        "function Flag::onPickup(%this, %obj) {}\n"
                    ),
                ),
                (
                    "server/images.cs",
                    concat!(
                        "datablock ShapeBaseImageData(FlagImage)\n{\n",
                        "   shapeFile = \"flag.dts\";\n",
                        "};\n",
                        "function serverInit(%game) {}\n"
                    ),
                ),
            ],
        );

        let analysis = Analyzer::new(vec![dir.path().to_path_buf()]).run().unwrap();

        assert!(analysis.diagnostics.is_empty());
        assert_eq!(analysis.project.files.len(), 2);
        assert!(analysis.project.globals.contains_key("serverinit"));
        assert!(analysis.project.bound["flag"].contains_key("onpickup"));
        assert_eq!(analysis.project.datablocks_by_name.len(), 2);
    }

    #[test]
    fn test_tables_identical_with_and_without_workers() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<(String, String)> = (0..12)
            .map(|i| {
                (
                    format!("chunk{i}.cs"),
                    format!(
                        "function helper{i}(%a, %b) {{}}\ndatablock ItemData(Item{i})\n{{\n   pickupRadius = {i};\n}};\n"
                    ),
                )
            })
            .collect();
        let borrowed: Vec<(&str, &str)> = files
            .iter()
            .map(|(n, s)| (n.as_str(), s.as_str()))
            .collect();
        write_scripts(dir.path(), &borrowed);

        let sequential = Analyzer::new(vec![dir.path().to_path_buf()]).run().unwrap();
        let parallel = Analyzer::new(vec![dir.path().to_path_buf()])
            .jobs(4)
            .run()
            .unwrap();

        let seq_json = serde_json::to_value(&sequential.project).unwrap();
        let par_json = serde_json::to_value(&parallel.project).unwrap();
        assert_eq!(seq_json, par_json);

        let seq_msgs: Vec<&str> = sequential.diagnostics.iter().map(|d| d.message.as_str()).collect();
        let par_msgs: Vec<&str> = parallel.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(seq_msgs, par_msgs);
    }

    #[test]
    fn test_cross_file_redeclaration_and_inheritance() {
        let dir = tempfile::tempdir().unwrap();
        write_scripts(
            dir.path(),
            &[
                ("a.cs", "function spawn(%a) {}\n"),
                ("b.cs", "function spawn(%a, %b) {}\n"),
                (
                    "c.cs",
                    "datablock ItemData(Relic) : Missing\n{\n   pickupRadius = 1;\n};\n",
                ),
            ],
        );

        let analysis = Analyzer::new(vec![dir.path().to_path_buf()]).run().unwrap();

        assert!(analysis
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::GlobalRedeclaredArity));
        assert!(analysis
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::UnknownParent));

        let relic = &analysis.project.datablocks
            [analysis.project.datablocks_by_name["relic"][0].0 as usize];
        assert!(relic.parents.is_empty());
    }

    #[test]
    fn test_baseline_feeds_reference_resolution() {
        let dir = tempfile::tempdir().unwrap();
        write_scripts(
            dir.path(),
            &[(
                "items.cs",
                "datablock ItemData(Gun)\n{\n   image = OldImage;\n   pickupRadius = 1;\n};\n",
            )],
        );

        // Without the baseline the image reference dangles.
        let bare = Analyzer::new(vec![dir.path().to_path_buf()]).run().unwrap();
        assert!(bare
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::DanglingReference));

        // A baseline carrying OldImage from a previous run satisfies it,
        // without any redeclaration warnings.
        let base_dir = tempfile::tempdir().unwrap();
        write_scripts(
            base_dir.path(),
            &[(
                "old.cs",
                "datablock ShapeBaseImageData(OldImage)\n{\n   shapeFile = \"old.dts\";\n};\n",
            )],
        );
        let previous = Analyzer::new(vec![base_dir.path().to_path_buf()])
            .run()
            .unwrap();
        let baseline = Baseline::from_project(&previous.project);

        let merged = Analyzer::new(vec![dir.path().to_path_buf()])
            .baseline(baseline)
            .run()
            .unwrap();
        assert!(merged
            .diagnostics
            .iter()
            .all(|d| d.kind != DiagnosticKind::DanglingReference));
        assert!(merged
            .diagnostics
            .iter()
            .all(|d| d.kind != DiagnosticKind::DatablockRedeclared));
    }
}
