//! End-to-end export tests: session in, merged PDF out.

use std::io::{BufWriter, Cursor};

use chrono::NaiveDate;
use frais_core::{
    page_count, Category, CompanyProfile, NewAttachment, NewExpenseLine, Session,
};
use printpdf::{BuiltinFont, Mm, PdfDocument};

const TODAY: (i32, u32, u32) = (2024, 6, 20);

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(TODAY.0, TODAY.1, TODAY.2).unwrap()
}

fn session() -> Session {
    Session::new("Jean Dupont", CompanyProfile::plain("IFEA SAS"), "€")
}

fn new_line(category: Category, amount: f64) -> NewExpenseLine {
    NewExpenseLine {
        date: NaiveDate::from_ymd_opt(2024, 6, 12).unwrap(),
        supplier: "Fournisseur".to_string(),
        description: "Objet".to_string(),
        category,
        amount,
        budget_code: None,
        attachment: None,
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 60, 60]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}

fn pdf_with_pages(n: usize) -> Vec<u8> {
    let (doc, page, layer) = PdfDocument::new("Justificatif", Mm(210.0), Mm(297.0), "L1");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).unwrap();
    doc.get_page(page)
        .get_layer(layer)
        .use_text("page 1", 12.0, Mm(20.0), Mm(280.0), &font);
    for i in 2..=n {
        let (page, layer) = doc.add_page(Mm(210.0), Mm(297.0), "L1");
        doc.get_page(page).get_layer(layer).use_text(
            format!("page {}", i),
            12.0,
            Mm(20.0),
            Mm(280.0),
            &font,
        );
    }
    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer).unwrap();
    writer.into_inner().unwrap()
}

#[test]
fn test_export_without_attachments_is_report_only() {
    let mut s = session();
    s.add_line(new_line(Category::Transport, 75.0)).unwrap();
    s.add_line(new_line(Category::Hotel, 120.0)).unwrap();

    let output = s.export_as_of(today()).unwrap();
    assert_eq!(page_count(&output.pdf).unwrap(), 1);
    assert!(output.warnings.is_empty());
    assert_eq!(output.filename, "NDF_Jean_Dupont_Juin_2024.pdf");
}

#[test]
fn test_export_appends_attachment_pages_in_order() {
    let mut s = session();

    let mut with_pdf = new_line(Category::Hotel, 120.0);
    with_pdf.attachment = Some(NewAttachment {
        filename: "facture_hotel.pdf".to_string(),
        bytes: pdf_with_pages(2),
    });
    s.add_line(with_pdf).unwrap();

    let mut with_image = new_line(Category::Transport, 33.0);
    with_image.attachment = Some(NewAttachment {
        filename: "ticket.png".to_string(),
        bytes: png_bytes(640, 480),
    });
    s.add_line(with_image).unwrap();

    // 1 report page + 2 PDF pages + 1 image page
    let output = s.export_as_of(today()).unwrap();
    assert_eq!(page_count(&output.pdf).unwrap(), 4);
    assert!(output.warnings.is_empty());
}

#[test]
fn test_corrupt_attachment_is_skipped_with_warning() {
    let mut s = session();

    let mut bad = new_line(Category::Divers, 9.0);
    bad.attachment = Some(NewAttachment {
        filename: "corrompu.pdf".to_string(),
        bytes: b"this is not a pdf".to_vec(),
    });
    s.add_line(bad).unwrap();

    let mut good = new_line(Category::Divers, 4.0);
    good.attachment = Some(NewAttachment {
        filename: "recu.png".to_string(),
        bytes: png_bytes(200, 200),
    });
    s.add_line(good).unwrap();

    let output = s.export_as_of(today()).unwrap();
    // Report + the one readable attachment.
    assert_eq!(page_count(&output.pdf).unwrap(), 2);
    assert_eq!(output.warnings.len(), 1);
    assert!(output.warnings[0].contains("corrompu.pdf"));
}

#[test]
fn test_empty_session_still_exports_signable_report() {
    let mut s = session();
    let output = s.export_as_of(today()).unwrap();
    assert_eq!(page_count(&output.pdf).unwrap(), 1);
    assert!(output.warnings.is_empty());
}

#[test]
fn test_totals_scenario() {
    let mut s = session();
    s.add_line(new_line(Category::Telephone, 50.0)).unwrap();
    s.add_line(new_line(Category::Divers, 10.5)).unwrap();

    let totals = s.totals();
    assert_eq!(totals.formatted_for(Category::Telephone), "50,00");
    assert_eq!(totals.formatted_for(Category::Divers), "10,50");
    assert_eq!(totals.formatted_for(Category::Reception), "0,00");
    assert_eq!(totals.formatted_grand_total(), "60,50");

    // The export still succeeds with these lines.
    assert!(s.export_as_of(today()).is_ok());
}

#[test]
fn test_export_rebuilt_after_signature_change() {
    let mut s = session();
    s.add_line(new_line(Category::Divers, 3.0)).unwrap();

    let without = s.export_as_of(today()).unwrap().pdf.clone();
    s.set_signature(Some(png_bytes(300, 100)));
    assert!(s.last_export().is_none());
    let with = s.export_as_of(today()).unwrap().pdf.clone();

    // Both render, and embedding the signature changes the document.
    assert_eq!(page_count(&without).unwrap(), 1);
    assert_eq!(page_count(&with).unwrap(), 1);
    assert_ne!(without, with);
}

#[test]
fn test_replace_lines_reflected_in_export() {
    let mut s = session();
    let mut with_att = new_line(Category::Divers, 5.0);
    with_att.attachment = Some(NewAttachment {
        filename: "recu.png".to_string(),
        bytes: png_bytes(100, 100),
    });
    s.add_line(with_att).unwrap();
    assert_eq!(page_count(&s.export_as_of(today()).unwrap().pdf).unwrap(), 2);

    // Dropping the line also drops its attachment from the merge.
    s.replace_lines(Vec::new());
    assert_eq!(page_count(&s.export_as_of(today()).unwrap().pdf).unwrap(), 1);
}
