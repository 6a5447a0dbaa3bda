//! Sample markup inputs for testing and demonstration.
//!
//! Each sample exercises a different classifier category.

/// Bare text fragment with no structural signals.
pub fn plain_fragment() -> &'static str {
    "These are plain sentences without any markup structure, the kind of \
     content a caller pastes straight into a conversion request."
}

/// Heading-driven prose with lists.
pub fn article_template() -> &'static str {
    r##"
<h1>The State of the Project</h1>
<p>Progress over the last quarter has been steady, with the team closing
out the remaining migration work ahead of schedule.</p>

<h2>Highlights</h2>
<ul>
    <li>Migration completed two weeks early</li>
    <li>Error budget untouched for 60 days</li>
    <li>Two new contributors onboarded</li>
</ul>

<h2>Next Steps</h2>
<p>The next milestone focuses on the reporting surface and the long tail
of compatibility fixes collected during the beta.</p>
"##
}

/// Table-heavy content.
pub fn report_template() -> &'static str {
    r##"
<table>
    <tr><th>Segment</th><th>Revenue</th><th>Growth</th></tr>
    <tr><td>Enterprise</td><td>$2.1M</td><td>+31%</td></tr>
    <tr><td>Mid-Market</td><td>$1.4M</td><td>+18%</td></tr>
    <tr><td>SMB</td><td>$0.7M</td><td>+12%</td></tr>
</table>
<p>Revenue grew in every segment, with enterprise leading the quarter.</p>
"##
}

/// Headings plus code blocks; should classify as technical.
pub fn technical_template() -> &'static str {
    r##"
<h1>Client Library Usage</h1>
<p>Initialize the client once and reuse it across requests:</p>
<pre><code>let client = Client::builder()
    .timeout(Duration::from_secs(5))
    .build()?;</code></pre>
<p>Inline calls such as <code>client.get(url)</code> return futures.</p>
"##
}

/// Interactive controls; should classify as a form.
pub fn form_template() -> &'static str {
    r##"
<form action="/submit" method="post">
    <label>Name <input type="text" name="name"></label>
    <label>Email <input type="email" name="email"></label>
    <button type="submit">Register</button>
</form>
"##
}

/// A complete document with structure already in place.
pub fn full_document_template() -> &'static str {
    r##"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Release Notes</title>
</head>
<body>
    <h1>Release 2.4</h1>
    <p>This release improves pagination of long tables.</p>
</body>
</html>"##
}
