use super::*;

#[test]
fn builtin_programs_share_the_common_prelude() {
    let s = BuiltinShaders.load().unwrap();
    for filter in FilterKind::ALL {
        let (name, src) = s.program(filter);
        assert!(src.contains("fn vs_main"), "{name}");
        assert!(src.contains("fn fs_main"), "{name}");
        assert!(src.contains("var<uniform> u_params"), "{name}");
    }
}

#[test]
fn warped_fetch_rounds_ties_up_like_the_host() {
    let s = BuiltinShaders.load().unwrap();
    let (_, src) = s.program(FilterKind::None);
    let body = src.split("fn warped").nth(1).unwrap();
    let body = &body[..body.find("\n}").unwrap()];
    assert!(body.contains("floor(mix(top, bottom, f.y) + 0.5)"), "{body}");
    assert!(!body.contains("round("), "{body}");
}

#[test]
fn program_names_follow_filter() {
    let s = ShaderSources::from_parts("// c", "a", "b", "k");
    assert_eq!(s.program(FilterKind::None), ("passthrough", "// c\na"));
    assert_eq!(s.program(FilterKind::Pixelate), ("pixelate", "// c\nb"));
    assert_eq!(s.program(FilterKind::KeepColor), ("keep_color", "// c\nk"));
}

#[test]
fn dir_loader_reads_all_four_files() {
    let dir = tempfile::tempdir().unwrap();
    for (name, body) in [
        ("common.wgsl", "// common"),
        ("passthrough.wgsl", "// pass"),
        ("pixelate.wgsl", "// pix"),
        ("keep_color.wgsl", "// keep"),
    ] {
        std::fs::write(dir.path().join(name), body).unwrap();
    }
    let s = DirShaderLoader::new(dir.path()).load().unwrap();
    assert_eq!(s.pixelate, "// common\n// pix");
}

#[test]
fn dir_loader_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = DirShaderLoader::new(dir.path()).load().unwrap_err().to_string();
    assert!(err.contains("common.wgsl"), "{err}");
}
