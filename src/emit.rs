use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{
    Color, ColNum, ExcelDateTime, Format, FormatAlign, FormatBorder, RowNum, Workbook, Worksheet,
};

use crate::{NormalizedRow, StatementDate, DATE_FORMAT};

/// Name of the worksheet holding the statement lines.
pub const SHEET_NAME: &str = "Movimientos";

/// Output columns in order, with their widths.
pub const COLUMNS: [(&str, f64); 9] = [
    ("Fecha", 12.0),
    ("Descripción", 48.0),
    ("Código operación", 18.0),
    ("Importe", 16.0),
    ("Saldo", 18.0),
    ("Tipo movimiento", 15.0),
    ("Fuente", 16.0),
    ("Imputación", 32.0),
    ("Cuenta", 10.0),
];

const MONEY_FORMAT: &str = "#,##0.00;[Red](#,##0.00)";
const EXCEL_DATE_FORMAT: &str = "yyyy-mm-dd";

/// The kinds of document statements can be written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Xlsx,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
        }
    }

    /// Render the rows in this format.
    pub fn render(&self, rows: &[NormalizedRow]) -> Result<Vec<u8>> {
        match self {
            OutputFormat::Xlsx => rows_to_xlsx(rows),
            OutputFormat::Csv => Ok(rows_to_csv(rows)?.into_bytes()),
        }
    }
}

/// Cell styles shared by every row of the sheet.
struct Styles {
    header: Format,
    money: Format,
    date: Format,
}

impl Styles {
    fn new() -> Self {
        Styles {
            header: Format::new()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(0x1F4E78))
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Center),
            money: Format::new().set_num_format(MONEY_FORMAT),
            date: Format::new().set_num_format(EXCEL_DATE_FORMAT),
        }
    }
}

/// Render the rows as an xlsx workbook held in memory.
///
/// The sheet has a header row followed by one row per statement line in
/// the order given. Any failure aborts the whole document.
pub fn rows_to_xlsx(rows: &[NormalizedRow]) -> Result<Vec<u8>> {
    let styles = Styles::new();
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, (title, width)) in COLUMNS.iter().enumerate() {
        let col = ColNum::try_from(col)?;
        worksheet.write_string_with_format(0, col, *title, &styles.header)?;
        worksheet.set_column_width(col, *width)?;
    }

    for (i, row) in rows.iter().enumerate() {
        write_row(worksheet, RowNum::try_from(i + 1)?, row, &styles)?;
    }

    let last_row = RowNum::try_from(rows.len())?;
    let last_col = ColNum::try_from(COLUMNS.len() - 1)?;
    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofilter(0, 0, last_row, last_col)?;

    Ok(workbook.save_to_buffer()?)
}

/// Write one statement line into the given sheet row.
fn write_row(
    worksheet: &mut Worksheet,
    at: RowNum,
    row: &NormalizedRow,
    styles: &Styles,
) -> Result<()> {
    match &row.date {
        StatementDate::Parsed(date) => match excel_date(date) {
            Some(datetime) => {
                worksheet.write_datetime_with_format(at, 0, &datetime, &styles.date)?;
            }
            // Out of the spreadsheet's calendar; keep the text.
            None => {
                worksheet.write_string(at, 0, date.format(DATE_FORMAT).to_string())?;
            }
        },
        StatementDate::Unparsed(text) => {
            worksheet.write_string(at, 0, text)?;
        }
    }
    worksheet.write_string(at, 1, &row.description)?;
    worksheet.write_string(at, 2, &row.operation_code)?;
    worksheet.write_number_with_format(at, 3, as_number(row.amount), &styles.money)?;
    worksheet.write_number_with_format(at, 4, as_number(row.balance), &styles.money)?;
    worksheet.write_string(at, 5, row.movement.to_string())?;
    worksheet.write_string(at, 6, &row.source)?;
    worksheet.write_string(at, 7, &row.category)?;
    if let Some(account) = &row.account {
        worksheet.write_string(at, 8, account)?;
    }
    Ok(())
}

fn excel_date(date: &NaiveDate) -> Option<ExcelDateTime> {
    let year = u16::try_from(date.year()).ok()?;
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8).ok()
}

fn as_number(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Return a string containing the CSV representation of the rows.
///
/// The header is always written, even when there are no rows.
pub fn rows_to_csv(rows: &[NormalizedRow]) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    wtr.write_record(COLUMNS.iter().map(|(title, _)| *title))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Cursor;

    use calamine::{Data, Reader, Xlsx};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use crate::{Degradations, MovementType};

    fn row(date: StatementDate, description: &str, amount: Decimal) -> NormalizedRow {
        NormalizedRow {
            date,
            description: description.to_string(),
            operation_code: String::new(),
            amount,
            balance: dec!(1000.50),
            movement: MovementType::from_amount(amount),
            source: "bancolombia".to_string(),
            category: "Por clasificar".to_string(),
            account: None,
            degraded: Degradations::default(),
        }
    }

    fn sample_rows() -> Vec<NormalizedRow> {
        vec![
            NormalizedRow {
                operation_code: "000123456789".to_string(),
                category: "Nómina".to_string(),
                account: Some("510506".to_string()),
                ..row(
                    StatementDate::Parsed(NaiveDate::from_ymd_opt(2025, 8, 21).unwrap()),
                    "PAGO NOMINA 000123456789",
                    dec!(-1387.00),
                )
            },
            row(
                StatementDate::Unparsed("21-08-2025".to_string()),
                "Compra varios",
                dec!(25.10),
            ),
            row(
                StatementDate::Parsed(NaiveDate::from_ymd_opt(2025, 8, 22).unwrap()),
                "CONSIGNACION",
                dec!(300000),
            ),
        ]
    }

    fn read_back(buffer: Vec<u8>) -> calamine::Range<Data> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(buffer)).unwrap();
        workbook.worksheet_range(SHEET_NAME).unwrap()
    }

    #[test]
    fn test_xlsx_has_header_and_one_row_per_line() {
        let rows = sample_rows();
        let range = read_back(rows_to_xlsx(&rows).unwrap());

        assert_eq!(range.height(), rows.len() + 1);
        assert_eq!(range.width(), COLUMNS.len());

        let header: Vec<String> = range.rows().next().unwrap().iter().map(|c| c.to_string()).collect();
        let expected: Vec<String> = COLUMNS.iter().map(|(t, _)| t.to_string()).collect();
        assert_eq!(header, expected);

        // Row order is preserved.
        let descriptions: Vec<String> = range.rows().skip(1).map(|r| r[1].to_string()).collect();
        assert_eq!(
            descriptions,
            vec!["PAGO NOMINA 000123456789", "Compra varios", "CONSIGNACION"]
        );
    }

    #[test]
    fn test_xlsx_cell_types() {
        let range = read_back(rows_to_xlsx(&sample_rows()).unwrap());

        // Parsed dates are real dates, degraded ones are kept as text.
        assert!(matches!(
            range.get_value((1, 0)),
            Some(Data::DateTime(_)) | Some(Data::Float(_))
        ));
        assert_eq!(
            range.get_value((2, 0)),
            Some(&Data::String("21-08-2025".to_string()))
        );

        assert_eq!(range.get_value((1, 2)), Some(&Data::String("000123456789".to_string())));
        assert_eq!(range.get_value((1, 3)), Some(&Data::Float(-1387.0)));
        assert_eq!(range.get_value((1, 4)), Some(&Data::Float(1000.5)));
        assert_eq!(range.get_value((1, 5)), Some(&Data::String("Débito".to_string())));
        assert_eq!(range.get_value((3, 5)), Some(&Data::String("Crédito".to_string())));
        assert_eq!(range.get_value((1, 7)), Some(&Data::String("Nómina".to_string())));
        assert_eq!(range.get_value((1, 8)), Some(&Data::String("510506".to_string())));
    }

    #[test]
    fn test_empty_xlsx_has_only_header() {
        let range = read_back(rows_to_xlsx(&[]).unwrap());
        assert_eq!(range.height(), 1);
    }

    #[test]
    fn test_out_of_range_date_does_not_abort_the_sheet() {
        let mut rows = sample_rows();
        rows.insert(
            1,
            row(
                StatementDate::Parsed(NaiveDate::from_ymd_opt(25, 8, 21).unwrap()),
                "Fecha mal digitada",
                dec!(-10),
            ),
        );
        let range = read_back(rows_to_xlsx(&rows).unwrap());

        assert_eq!(range.height(), rows.len() + 1);
        assert_eq!(
            range.get_value((2, 0)),
            Some(&Data::String("0025-08-21".to_string()))
        );
        assert_eq!(range.get_value((2, 3)), Some(&Data::Float(-10.0)));
        // The rows around it are untouched.
        assert!(matches!(
            range.get_value((1, 0)),
            Some(Data::DateTime(_)) | Some(Data::Float(_))
        ));
        assert_eq!(
            range.get_value((3, 0)),
            Some(&Data::String("21-08-2025".to_string()))
        );
    }

    #[test]
    fn test_empty_csv_has_only_header() {
        assert_eq!(
            rows_to_csv(&[]).unwrap(),
            "Fecha,Descripción,Código operación,Importe,Saldo,Tipo movimiento,Fuente,Imputación,Cuenta\n"
        );
    }

    #[test]
    fn test_csv_serialization() {
        let result = rows_to_csv(&sample_rows()).unwrap();
        let expected = "Fecha,Descripción,Código operación,Importe,Saldo,Tipo movimiento,Fuente,Imputación,Cuenta\n\
                        2025-08-21,PAGO NOMINA 000123456789,000123456789,-1387.00,1000.50,Débito,bancolombia,Nómina,510506\n\
                        21-08-2025,Compra varios,,25.10,1000.50,Crédito,bancolombia,Por clasificar,\n\
                        2025-08-22,CONSIGNACION,,300000,1000.50,Crédito,bancolombia,Por clasificar,\n";
        assert_eq!(result, expected);
    }

    #[test]
    fn test_output_format() {
        assert_eq!(OutputFormat::default().extension(), "xlsx");
        assert_eq!(OutputFormat::Csv.extension(), "csv");
        let rendered = OutputFormat::Csv.render(&sample_rows()).unwrap();
        assert!(String::from_utf8(rendered).unwrap().starts_with("Fecha,"));
    }
}
