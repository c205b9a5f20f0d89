//! Integration test modules and shared fixtures

mod export_roundtrip;
mod import_log_tests;
mod import_tests;

use testlink_core::store::Database;

/// Two levels of suites, steps, keywords, requirements and custom fields
pub const SHOP_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuite id="10" name="Shop">
  <node_order>1</node_order>
  <details><![CDATA[<p>Web shop regression</p>]]></details>
  <testsuite id="11" name="Checkout">
    <node_order>1</node_order>
    <details><![CDATA[Cart and payment]]></details>
    <testsuite id="12" name="Payment">
      <testcase internalid="1001" name="Pay by card">
        <node_order>1</node_order>
        <externalid>SHOP-1</externalid>
        <version>2</version>
        <summary><![CDATA[<p>Card payment succeeds</p>]]></summary>
        <preconditions><![CDATA[<p>Cart has one item</p>]]></preconditions>
        <execution_type>2</execution_type>
        <importance>3</importance>
        <steps>
          <step>
            <step_number>1</step_number>
            <actions><![CDATA[<p>Enter card number</p>]]></actions>
            <expectedresults><![CDATA[Card accepted]]></expectedresults>
            <execution_type>1</execution_type>
          </step>
          <step>
            <step_number>2</step_number>
            <actions><![CDATA[Confirm]]></actions>
            <expectedresults><![CDATA[Receipt shown]]></expectedresults>
          </step>
        </steps>
        <keywords>
          <keyword name="smoke"><notes><![CDATA[run on every build]]></notes></keyword>
          <keyword name="payment"/>
        </keywords>
        <requirements>
          <requirement>
            <req_spec_title><![CDATA[Payments]]></req_spec_title>
            <doc_id><![CDATA[REQ-PAY-1]]></doc_id>
            <title><![CDATA[Card payments]]></title>
          </requirement>
        </requirements>
        <custom_fields>
          <custom_field>
            <name><![CDATA[Component]]></name>
            <value><![CDATA[Billing]]></value>
          </custom_field>
        </custom_fields>
      </testcase>
    </testsuite>
    <testcase internalid="1002" name="Add to cart">
      <summary><![CDATA[Item appears in cart]]></summary>
      <steps>
        <step>
          <step_number>1</step_number>
          <actions><![CDATA[Click add]]></actions>
          <expectedresults><![CDATA[Badge shows 1]]></expectedresults>
        </step>
      </steps>
    </testcase>
  </testsuite>
</testsuite>
"#;

/// Fresh in-memory database with one project
pub fn setup() -> (Database, i64) {
    let db = Database::open_in_memory().expect("in-memory database");
    let project = db
        .create_project("Shop", Some("Web shop"))
        .expect("project insert");
    (db, project.id)
}
