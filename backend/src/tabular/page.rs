const FORM_HEAD: &str = r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="utf-8" />
    <title>Predicción Titanic</title>
</head>
<body>
    <h2>Predicción Titanic</h2>
    <form action="/predict_web" method="post">
        Edad: <input type="number" step="any" name="Age" value="34"><br><br>
        Pclass: <input type="number" name="Pclass" value="3"><br><br>
        Fare: <input type="text" name="Fare" value="7.8292"><br><br>
        Parch: <input type="number" name="Parch" value="0"><br><br>
        SibSp: <input type="number" name="SibSp" value="0"><br><br>
        C: <input type="checkbox" name="C"><br><br>
        Q: <input type="checkbox" name="Q" checked><br><br>
        S: <input type="checkbox" name="S"><br><br>
        Sexo:<br>
        <input type="radio" name="female" value="1"> Mujer
        <input type="radio" name="male" value="1" checked> Hombre
        <br><br>
        <input type="submit" value="Predecir">
    </form>
"#;

const FORM_TAIL: &str = "</body>\n</html>\n";

/// Renders the passenger form, with the predicted label or an error below it.
pub fn render(prediction: Option<i64>, error: Option<&str>) -> String {
    let mut result = String::new();
    if let Some(label) = prediction {
        result.push_str(&format!("    <h3>Resultado: {}</h3>\n", label));
    }
    if let Some(message) = error {
        result.push_str(&format!(
            "    <p style=\"color:#d93025\">Error: {}</p>\n",
            escape_html(message)
        ));
    }
    format!("{}{}{}", FORM_HEAD, result, FORM_TAIL)
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
