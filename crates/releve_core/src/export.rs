//! Export driver: one styled sheet per floor, one workbook per school.

use std::collections::BTreeSet;

use releve_io_xlsx::{SpecXlsxSheetWriteOptions, WorkbookSink, XlsxWriter};
use tracing::{error, info};

use crate::border::apply_border_styles;
use crate::conf::{
    L_STATIC_COLUMN_LABELS, N_ROW_HEADER_GROUP, N_ROW_HEADER_OPTION, N_ROW_TITLE,
    SpecExportOptions,
};
use crate::layout::{build_header_layout, compose_floor_grid};
use crate::registry::derive_attribute_groups;
use crate::spec::{ExportError, SpecExportReport, SpecSchool};
use crate::util::{derive_export_file_name, derive_sheet_name};

/// Lay out every floor of `school` and append it to `sink`, in floor order.
///
/// The sink is not written to disk; see [`export_school_to_file`].
pub fn export_school<S: WorkbookSink>(
    school: &SpecSchool,
    sink: &mut S,
    options: &SpecExportOptions,
) -> Result<SpecExportReport, ExportError> {
    if school.floors.is_empty() {
        return Err(ExportError::NoFloors);
    }

    let groups = derive_attribute_groups();
    let layout = build_header_layout(&groups, &L_STATIC_COLUMN_LABELS, N_ROW_HEADER_GROUP);
    let cfg_sheet_write = SpecXlsxSheetWriteOptions {
        rows_header: BTreeSet::from([N_ROW_HEADER_GROUP, N_ROW_HEADER_OPTION]),
        rows_title: BTreeSet::from([N_ROW_TITLE]),
    };

    let mut report = SpecExportReport::default();
    for floor in &school.floors {
        let sheet = compose_floor_grid(
            &school.name,
            floor,
            &groups,
            &layout,
            options.n_rows_data_min,
        );
        let styled = apply_border_styles(&sheet);

        let c_sheet_name = sink
            .append_sheet(
                &styled.grid,
                &styled.borders,
                &derive_sheet_name(&floor.name),
                &cfg_sheet_write,
            )
            .map_err(ExportError::Sink)?;

        report.sheet_names.push(c_sheet_name);
        report.rows_real_by_sheet.push(sheet.n_rows_real);
    }

    Ok(report)
}

/// Export `school` to `<dir_out>/<prefix><school_name>.<ext>` with [`XlsxWriter`].
pub fn export_school_to_file(
    school: &SpecSchool,
    options: &SpecExportOptions,
) -> Result<SpecExportReport, ExportError> {
    let mut writer = XlsxWriter::default();
    let mut report = export_school(school, &mut writer, options)?;

    let path_file_out = options.dir_out.join(derive_export_file_name(
        &school.name,
        &options.file_name_prefix,
        &options.file_name_ext,
    ));
    writer.write_file(&path_file_out).map_err(|err| {
        error!(path = %path_file_out.display(), "{err}");
        ExportError::Sink(err)
    })?;

    report.reports_by_sheet = writer.report();
    info!(
        school = %school.name,
        sheets = report.sheet_names.len(),
        path = %path_file_out.display(),
        "workbook exported"
    );
    report.path_file_out = Some(path_file_out);
    Ok(report)
}
