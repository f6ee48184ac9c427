//! HTML bodies. No templating engine; the pages are tiny.

/// Upload form served at `/`.
pub const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>CropSense - crop an image</title>
</head>
<body>
<h1>Crop an image</h1>
<form action="/crop" method="post" enctype="multipart/form-data">
  <p><input type="file" name="file" accept="image/*" required></p>
  <p>
    <label>Left <input type="number" name="left" placeholder="0"></label>
    <label>Top <input type="number" name="top" placeholder="0"></label>
    <label>Right <input type="number" name="right" placeholder="width"></label>
    <label>Bottom <input type="number" name="bottom" placeholder="height"></label>
  </p>
  <p><button type="submit">Crop</button></p>
</form>
</body>
</html>
"#;

/// Confirmation page for a finished crop.
pub fn crop_success(original_filename: &str, image_url: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head><meta charset=\"utf-8\"><title>Image cropped</title></head>\n\
         <body>\n\
         <h2>Image cropped successfully!</h2>\n\
         <p>{}</p>\n\
         <img src=\"{}\" width=\"300\" alt=\"cropped image\"><br>\n\
         <a href=\"/\">Go Back</a>\n\
         </body>\n\
         </html>\n",
        escape_html(original_filename),
        escape_html(image_url),
    )
}

/// Escape text for use in element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
