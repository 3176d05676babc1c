use approx::assert_relative_eq;
use horizon_scan::horizons::ah::DIAGNOSTIC_COLUMNS;
use horizon_scan::{CutSpec, HorizonError, ScanOptions, SimDir};
use std::f64::consts::PI;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn diagnostics_row(iteration: u64, time: f64, area: f64) -> String {
    let mut row = vec![0.25; DIAGNOSTIC_COLUMNS.len()];
    row[0] = iteration as f64;
    row[1] = time;
    row[25] = area;
    row.iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join("\t")
}

fn sphere_file(radius: f64, n_theta: usize, n_phi: usize) -> String {
    let mut text = String::from("# shape of apparent horizon\n");
    for (label, start, end) in [("+z", 0.0, PI / 2.0), ("-z", PI / 2.0, PI)] {
        text.push_str(&format!("### {} patch\n", label));
        for i in 0..n_theta {
            let theta = start + (end - start) * i as f64 / (n_theta - 1) as f64;
            for j in 0..n_phi {
                let phi = 2.0 * PI * j as f64 / (n_phi - 1) as f64;
                text.push_str(&format!(
                    "{} {} {} {} {} {}\n",
                    i,
                    j,
                    radius,
                    radius * theta.sin() * phi.cos(),
                    radius * theta.sin() * phi.sin(),
                    radius * theta.cos()
                ));
            }
            text.push('\n');
        }
    }
    text
}

/// Two restarts with overlapping output, plus decoys the scanner must skip.
fn build_simulation(root: &Path) {
    let qlm_header = "# QUASILOCALMEASURES::qlm_scalars\n# data columns: 3:qlm_time[0] 4:qlm_mass[0] 5:qlm_irreducible_mass[0]\n";
    write(
        root,
        "output-0000/bbh/quasilocalmeasures-qlm_scalars..asc",
        &format!("{}0 0.0 0.0 0.9 0.8\n32 1.0 1.0 0.91 0.81\n64 2.0 2.0 0.92 0.82\n", qlm_header),
    );
    write(
        root,
        "output-0001/bbh/quasilocalmeasures-qlm_scalars..asc",
        &format!("{}48 1.5 1.5 0.95 0.85\n80 2.5 2.5 0.96 0.86\n", qlm_header),
    );

    write(
        root,
        "output-0000/bbh/BH_diagnostics.ah1.gp",
        &format!(
            "# apparent horizon 1/1\n{}\n{}\n",
            diagnostics_row(32, 1.0, 12.0),
            diagnostics_row(64, 2.0, 12.5)
        ),
    );
    write(
        root,
        "output-0001/bbh/BH_diagnostics.ah1.gp",
        &format!(
            "{}\n{}\n",
            diagnostics_row(48, 1.5, 13.0),
            diagnostics_row(80, 2.5, 13.5)
        ),
    );

    write(root, "output-0000/bbh/h.t32.ah1.gp", &sphere_file(1.0, 9, 33));
    write(root, "output-0000/bbh/h.t64.ah1.gp", &sphere_file(1.0, 9, 33));
    write(root, "output-0001/bbh/h.t64.ah1.gp", &sphere_file(2.0, 9, 33));

    write(root, "SIMFACTORY/BH_diagnostics.ah7.gp", "0 0.0 1.0\n");
    write(root, ".trash/h.t0.ah9.gp", "0 0 1 0 0 1\n");
    write(root, "output-0000/bbh/carpet-grid.asc", "0 0 0\n");
}

#[test]
fn test_scan_finds_horizon_files_only() {
    let dir = TempDir::new().unwrap();
    build_simulation(dir.path());

    let sim = SimDir::open(dir.path()).unwrap();
    let files = sim.files();
    assert_eq!(files.qlm_files.len(), 2);
    assert_eq!(files.ah_diagnostics.keys().copied().collect::<Vec<_>>(), vec![1]);
    assert_eq!(files.ah_diagnostics[&1].len(), 2);
    assert_eq!(files.ah_shapes[&1][&64].len(), 2);
    assert_eq!(files.file_count(), 7);
}

#[test]
fn test_restarts_are_merged() {
    let dir = TempDir::new().unwrap();
    build_simulation(dir.path());

    let horizons = SimDir::open(dir.path()).unwrap().horizons().unwrap();
    assert_eq!(horizons.available_qlm_horizons(), vec![0]);
    assert_eq!(horizons.available_apparent_horizons(), vec![1]);

    let horizon = horizons.get(Some(0), Some(1)).unwrap();
    let mass = horizon.quantity("mass").unwrap();
    assert_eq!(mass.t(), &[0.0, 1.0, 1.5, 2.5]);
    assert_eq!(mass.y(), &[0.9, 0.91, 0.95, 0.96]);
    assert_eq!(
        horizon.available_quantities(),
        vec!["irreducible_mass".to_string(), "mass".to_string()]
    );

    let area = horizon.ah().quantity("area").unwrap();
    assert_eq!(area.t(), &[1.0, 1.5, 2.5]);
    assert_eq!(area.y(), &[12.0, 13.0, 13.5]);
    assert_eq!(horizon.formation_time(), Some(1.0));
    assert_eq!(
        horizon.ah().available_quantities().len(),
        DIAGNOSTIC_COLUMNS.len() - 1
    );
}

#[test]
fn test_shapes_and_cuts() {
    let dir = TempDir::new().unwrap();
    build_simulation(dir.path());

    let horizons = SimDir::open(dir.path()).unwrap().horizons().unwrap();
    let horizon = horizons.get_apparent_horizon(1).unwrap();
    assert_eq!(horizon.shape_iterations(), vec![32, 64]);
    assert_relative_eq!(horizon.shape_time_at_iteration(48).unwrap(), 1.5);
    assert!(matches!(
        horizon.shape_time_at_iteration(64),
        Err(HorizonError::IterationNotFound { iteration: 64, .. })
    ));

    // The later restart wrote the radius 2 surface.
    let shape = horizon.shape_at_iteration(64).unwrap();
    let extent = shape.extent();
    assert_relative_eq!(extent[0].1, 2.0, epsilon = 1e-12);

    let cut: CutSpec = "z=0".parse().unwrap();
    let outline = horizon.shape_outline_at_iteration(32, &cut).unwrap();
    for (x, y) in outline.coordinates[0].iter().zip(&outline.coordinates[1]) {
        assert_relative_eq!((x * x + y * y).sqrt(), 1.0, epsilon = 1e-9);
    }

    let line = horizon
        .shape_outline_at_iteration(64, &"x=0,z=0".parse().unwrap())
        .unwrap();
    let ys = line.coordinates[0].clone();
    assert_eq!(ys.len(), 2);
    assert_relative_eq!(ys[0], -2.0, epsilon = 1e-9);
    assert_relative_eq!(ys[1], 2.0, epsilon = 1e-9);

    assert!(horizon.shape_at_iteration(96).is_err());
}

#[test]
fn test_custom_scan_options() {
    let dir = TempDir::new().unwrap();
    build_simulation(dir.path());

    let options = ScanOptions {
        max_depth: 8,
        ignored_dirs: vec![],
    };
    let sim = SimDir::open_with(dir.path(), options).unwrap();
    assert!(sim.files().ah_diagnostics.contains_key(&7));
    assert!(!sim.files().ah_shapes.contains_key(&9));

    let shallow = ScanOptions {
        max_depth: 1,
        ..ScanOptions::default()
    };
    let sim = SimDir::open_with(dir.path(), shallow).unwrap();
    assert!(sim.files().is_empty());
}
