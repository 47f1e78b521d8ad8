// Integration tests for cli/op_mode.rs: mode and level defaults.

use zlibr::cli::op_mode::{detect_alias, determine_op_mode, init_c_level_from, OpMode};

#[test]
fn suffix_decides_auto_mode() {
    assert_eq!(determine_op_mode("notes.txt.gz"), OpMode::Decompress);
    assert_eq!(determine_op_mode("notes.txt.zz"), OpMode::Decompress);
    assert_eq!(determine_op_mode("notes.txt"), OpMode::Compress);
    assert_eq!(determine_op_mode("notes.gzip"), OpMode::Compress);
}

#[test]
fn aliases() {
    assert_eq!(detect_alias("unzlibr"), (OpMode::Decompress, false));
    assert_eq!(detect_alias("/opt/bin/zlibrcat"), (OpMode::Decompress, true));
    assert_eq!(detect_alias("zlibr"), (OpMode::Auto, false));
}

#[test]
fn level_from_environment() {
    assert_eq!(init_c_level_from(None), 6);
    assert_eq!(init_c_level_from(Some(" 3 ")), 3);
    assert_eq!(init_c_level_from(Some("12")), 6);
    assert_eq!(init_c_level_from(Some("fast")), 6);
}
